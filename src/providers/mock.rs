/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock providers that simulate different behaviors:
 * - `MockProvider::working()` - Always succeeds, tagging every segment
 * - `MockProvider::dropping_last()` - Returns one segment fewer than requested
 * - `MockProvider::failing()` - Always fails with an error
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::Provider;
use crate::translation::codec::SEPARATOR;

/// Prompt pair received by the mock
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// The system message
    pub system_prompt: String,
    /// The user message
    pub user_prompt: String,
}

impl MockRequest {
    /// The delimited payload, i.e. everything after the first blank line of the user prompt
    pub fn payload(&self) -> &str {
        self.user_prompt
            .split_once("\n\n")
            .map(|(_, payload)| payload)
            .unwrap_or("")
    }

    /// Payload split on the segment separator
    pub fn segments(&self) -> Vec<&str> {
        self.payload().split(SEPARATOR).collect()
    }
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds, prefixing each segment with "[TRANSLATED] "
    Working,
    /// Succeeds but drops the last segment
    DropLast,
    /// Succeeds but appends one spurious segment
    ExtraSegment,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty response
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Last request received
    last_request: Arc<Mutex<Option<MockRequest>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            last_request: Arc::new(Mutex::new(None)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock that loses the last segment
    pub fn dropping_last() -> Self {
        Self::new(MockBehavior::DropLast)
    }

    /// Create a mock that adds a trailing segment
    pub fn extra_segment() -> Self {
        Self::new(MockBehavior::ExtraSegment)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that answers after a delay
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Number of completion calls received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// The most recent request, if any
    pub fn last_request(&self) -> Option<MockRequest> {
        self.last_request.lock().ok().and_then(|guard| guard.clone())
    }

    /// Tag every segment the way the working mock does
    pub fn generate_batch_response(segments: &[&str]) -> String {
        segments
            .iter()
            .map(|segment| format!("[TRANSLATED] {}", segment))
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    fn respond(&self, request: &MockRequest) -> String {
        if let Some(generator) = self.custom_response {
            return generator(request);
        }
        Self::generate_batch_response(&request.segments())
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            last_request: Arc::clone(&self.last_request),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let request = MockRequest {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
        };
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(&request)),

            MockBehavior::DropLast => {
                let segments = request.segments();
                let kept = &segments[..segments.len().saturating_sub(1)];
                Ok(Self::generate_batch_response(kept))
            }

            MockBehavior::ExtraSegment => {
                let mut text = self.respond(&request);
                text.push_str(SEPARATOR);
                text.push_str("Note: translation complete");
                Ok(text)
            }

            MockBehavior::Intermittent { fail_every } => {
                if fail_every > 0 && count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.respond(&request))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.respond(&request))
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }

    fn describe(&self) -> String {
        format!("mock provider ({:?})", self.behavior)
    }
}
