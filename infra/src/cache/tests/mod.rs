mod memory_code_cache_tests;
