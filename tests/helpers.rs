//! Test utilities shared by the integration tests

use async_trait::async_trait;
use dossier::{
    ActivityBinding, ActivityError, ActivityExecutor, EventPublisher, PublishError,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Activity executor driven by a per-activity script of outcomes.
///
/// Each call pops the next scripted outcome for the bound activity name;
/// when the queue is empty, the `always` outcome (if any) repeats. Every
/// invocation is recorded for assertions.
#[derive(Default)]
pub struct ScriptedActivity {
    script: Mutex<HashMap<String, VecDeque<Result<Value, String>>>>,
    always: Mutex<HashMap<String, Result<Value, String>>>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl ScriptedActivity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue one successful response for an activity.
    pub fn respond(self, activity: &str, result: Value) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry(activity.to_string())
            .or_default()
            .push_back(Ok(result));
        self
    }

    /// Make every call to an activity fail.
    pub fn fail_always(self, activity: &str, reason: &str) -> Self {
        self.always
            .lock()
            .unwrap()
            .insert(activity.to_string(), Err(reason.to_string()));
        self
    }

    /// Number of calls made to an activity.
    pub fn call_count(&self, activity: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == activity)
            .count()
    }

    /// The inputs of the most recent call to an activity.
    pub fn last_inputs(&self, activity: &str) -> Option<Map<String, Value>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| name == activity)
            .map(|(_, inputs)| inputs.clone())
    }
}

#[async_trait]
impl ActivityExecutor for ScriptedActivity {
    async fn invoke(
        &self,
        binding: &ActivityBinding,
        inputs: &Map<String, Value>,
    ) -> Result<Value, ActivityError> {
        self.calls
            .lock()
            .unwrap()
            .push((binding.name.to_string(), inputs.clone()));

        let scripted = self
            .script
            .lock()
            .unwrap()
            .get_mut(binding.name)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.always.lock().unwrap().get(binding.name).cloned());

        match scripted {
            Some(Ok(result)) => Ok(result),
            Some(Err(reason)) => Err(ActivityError::Transport {
                activity: binding.name.to_string(),
                reason,
            }),
            None => Err(ActivityError::Transport {
                activity: binding.name.to_string(),
                reason: "no scripted response".to_string(),
            }),
        }
    }
}

/// Publisher that records every event, optionally failing each publish.
#[derive(Default)]
pub struct CollectingPublisher {
    events: Mutex<Vec<(String, Map<String, Value>)>>,
    fail_all: bool,
}

impl CollectingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every publish attempt fails.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail_all: true,
        }
    }

    /// Event types in emission order.
    pub fn event_types(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(event_type, _)| event_type.clone())
            .collect()
    }

    /// Payloads of every event of the given type.
    pub fn payloads_of(&self, event_type: &str) -> Vec<Map<String, Value>> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == event_type)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for CollectingPublisher {
    async fn publish(
        &self,
        event_type: &str,
        payload: Map<String, Value>,
    ) -> Result<(), PublishError> {
        self.events
            .lock()
            .unwrap()
            .push((event_type.to_string(), payload));
        if self.fail_all {
            Err(PublishError("event channel down".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Sample crawler result in the shape the Twitter stub returns.
pub fn sample_twitter_result() -> Value {
    serde_json::json!({
        "username": "alice_crypto",
        "profile": {
            "bio": "Crypto enthusiast and blockchain developer",
            "followers": 1523,
            "location": "San Francisco",
        },
        "recent_posts": [
            {"post_id": "p1", "text": "First tweet about crypto", "likes": 42},
            {"post_id": "p2", "text": "Second tweet about NFTs", "likes": 38},
            {"post_id": "p3", "text": "Third tweet about DeFi", "likes": 55},
        ],
    })
}
