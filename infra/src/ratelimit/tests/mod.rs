mod memory_sliding_window_tests;
