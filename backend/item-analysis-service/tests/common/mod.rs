//! Shared fakes for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use item_analysis_service::providers::{
    MarketListing, MarketSearch, MarketSearchResult, PromptPayload, VisionProvider,
};
use secrecy::SecretString;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A valid provider reply
pub fn valid_reply() -> String {
    json!({
        "nameJaSpecific": "象印 電気ケトル CK-DA10",
        "nameEnSpecific": "Zojirushi Electric Kettle CK-DA10",
        "nameJaGeneric": "電気ケトル",
        "nameEnGeneric": "Electric kettle",
        "description": "1.0Lの電気ケトル。使用感少なめ。",
        "category": "kitchenware",
        "condition": "good",
        "quantity": 1,
        "onlinePrice": { "low": 1500, "high": 2800, "confidence": 0.7 },
        "thriftPrice": { "low": 300, "high": 800, "confidence": 0.6 },
        "recommendedAction": "online-sale",
        "actionRationale": "動作品は中古でも需要がある",
        "marketplaces": ["メルカリ", "ラクマ"],
        "searchQueries": ["象印 CK-DA10"],
        "keywords": ["kettle"],
        "specialNotes": null,
        "disposalCost": null
    })
    .to_string()
}

/// Vision provider that replays a script of outcomes, one per call
///
/// The last entry repeats once the script runs out.
pub struct ScriptedVision {
    script: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
    delay: Option<Duration>,
    calls: AtomicU32,
}

impl ScriptedVision {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            delay: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new(vec![Ok(reply.into())])
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(vec![Err(message.into())])
    }

    /// Every call waits `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> Result<String, String> {
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(outcome) = script.pop_front() {
            *last = Some(outcome);
        }
        last.clone()
            .unwrap_or_else(|| Err("script is empty".to_string()))
    }
}

#[async_trait]
impl VisionProvider for ScriptedVision {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate(
        &self,
        _api_key: &SecretString,
        _payload: &PromptPayload,
    ) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_outcome().map_err(|message| anyhow::anyhow!(message))
    }

    async fn probe(&self, _api_key: &SecretString) -> anyhow::Result<()> {
        Ok(())
    }
}

pub enum SearchBehavior {
    Listings(usize),
    Fail(&'static str),
    Hang,
}

/// Market search with a fixed behavior
pub struct FakeSearch {
    behavior: SearchBehavior,
    calls: AtomicU32,
}

impl FakeSearch {
    pub fn new(behavior: SearchBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketSearch for FakeSearch {
    async fn search(
        &self,
        _api_key: &SecretString,
        query: &str,
        num_results: u32,
    ) -> anyhow::Result<MarketSearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            SearchBehavior::Listings(n) => Ok(MarketSearchResult {
                listings: (0..(*n).min(num_results as usize))
                    .map(|i| MarketListing {
                        title: format!("{} #{}", query, i),
                        url: format!("https://example.com/listing/{}", i),
                        published_date: None,
                    })
                    .collect(),
                estimated_cost: Some(0.005),
            }),
            SearchBehavior::Fail(message) => Err(anyhow::anyhow!(*message)),
            SearchBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(MarketSearchResult::default())
            }
        }
    }
}
