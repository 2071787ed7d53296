//! Mock implementations for testing verification service

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::entities::verification_code::{IssueOutcome, VerifyOutcome, MAX_ATTEMPTS};
use crate::errors::{DispatchError, StoreError};
use crate::services::verification::traits::{CodeCacheTrait, SmsServiceTrait};

/// A message captured by the mock provider
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub template_id: String,
    pub args: Vec<String>,
    pub destination: String,
}

// Mock SMS service for testing
pub struct MockSmsService {
    pub sent_messages: Arc<Mutex<Vec<SentMessage>>>,
    pub failure: Option<DispatchError>,
}

impl MockSmsService {
    pub fn new() -> Self {
        Self {
            sent_messages: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    pub fn failing(error: DispatchError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new()
        }
    }

    pub fn get_sent_code(&self, destination: &str) -> Option<String> {
        self.sent_messages
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|m| m.destination == destination)
            .and_then(|m| m.args.first().cloned())
    }

    pub fn sent_count(&self) -> usize {
        self.sent_messages.lock().unwrap().len()
    }
}

#[async_trait]
impl SmsServiceTrait for MockSmsService {
    async fn send(
        &self,
        template_id: &str,
        args: &[String],
        destinations: &[String],
    ) -> Result<(), DispatchError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let mut sent = self.sent_messages.lock().unwrap();
        for destination in destinations {
            sent.push(SentMessage {
                template_id: template_id.to_string(),
                args: args.to_vec(),
                destination: destination.clone(),
            });
        }
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

// Mock code cache: a record lives until matched or exhausted, cooldown never elapses
pub struct MockCodeCache {
    pub codes: Arc<Mutex<HashMap<String, (String, u32)>>>, // key -> (code, remaining tries)
    pub should_fail: bool,
    pub verify_calls: Arc<Mutex<usize>>,
}

impl MockCodeCache {
    pub fn new(should_fail: bool) -> Self {
        Self {
            codes: Arc::new(Mutex::new(HashMap::new())),
            should_fail,
            verify_calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn stored_code(&self, scope: &str, destination: &str) -> Option<String> {
        self.codes
            .lock()
            .unwrap()
            .get(&format!("{}:{}", scope, destination))
            .map(|(code, _)| code.clone())
    }

    pub fn verify_calls(&self) -> usize {
        *self.verify_calls.lock().unwrap()
    }
}

#[async_trait]
impl CodeCacheTrait for MockCodeCache {
    async fn issue(
        &self,
        scope: &str,
        destination: &str,
        code: &str,
    ) -> Result<IssueOutcome, StoreError> {
        if self.should_fail {
            return Err(StoreError::Unavailable("Cache service error".to_string()));
        }
        let mut codes = self.codes.lock().unwrap();
        let key = format!("{}:{}", scope, destination);
        if codes.contains_key(&key) {
            return Ok(IssueOutcome::Cooldown);
        }
        codes.insert(key, (code.to_string(), MAX_ATTEMPTS));
        Ok(IssueOutcome::Admitted)
    }

    async fn verify(
        &self,
        scope: &str,
        destination: &str,
        candidate: &str,
    ) -> Result<VerifyOutcome, StoreError> {
        *self.verify_calls.lock().unwrap() += 1;
        if self.should_fail {
            return Err(StoreError::Unavailable("Cache service error".to_string()));
        }
        let mut codes = self.codes.lock().unwrap();
        let key = format!("{}:{}", scope, destination);
        let Some((stored, tries)) = codes.get_mut(&key) else {
            return Ok(VerifyOutcome::Mismatch);
        };
        if stored.as_str() == candidate {
            codes.remove(&key);
            return Ok(VerifyOutcome::Match);
        }
        *tries -= 1;
        if *tries == 0 {
            codes.remove(&key);
            return Ok(VerifyOutcome::AttemptsExhausted);
        }
        Ok(VerifyOutcome::Mismatch)
    }
}
