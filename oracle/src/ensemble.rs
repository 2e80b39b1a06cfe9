use crate::error::{Error, Result};
use crate::oracle::SemanticOracle;
use async_trait::async_trait;
use substrate_lens::Value;

struct Member {
    oracle: Box<dyn SemanticOracle>,
    weight: f64,
}

/// A weighted combination of oracles (§4.E: "ensemble of weighted metrics").
/// `restructure`/`reconstitute` delegate to the first (primary) member --
/// structural transforms aren't meaningfully averaged -- while `distance`
/// is the weighted mean of every member's distance, normalized by the sum
/// of weights so callers don't need to pre-normalize.
pub struct Ensemble {
    members: Vec<Member>,
}

impl Ensemble {
    pub fn new() -> Self {
        Self { members: Vec::new() }
    }

    pub fn with_member(mut self, oracle: Box<dyn SemanticOracle>, weight: f64) -> Self {
        self.members.push(Member { oracle, weight });
        self
    }

    fn total_weight(&self) -> f64 {
        self.members.iter().map(|m| m.weight).sum()
    }
}

impl Default for Ensemble {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SemanticOracle for Ensemble {
    async fn restructure(&self, value: &Value) -> Result<Value> {
        let primary = self
            .members
            .first()
            .ok_or_else(|| Error::Unavailable("ensemble has no members".into()))?;
        primary.oracle.restructure(value).await
    }

    async fn reconstitute(&self, value: &Value) -> Result<Value> {
        let primary = self
            .members
            .first()
            .ok_or_else(|| Error::Unavailable("ensemble has no members".into()))?;
        primary.oracle.reconstitute(value).await
    }

    async fn distance(&self, a: &Value, b: &Value) -> Result<f64> {
        if self.members.is_empty() {
            return Err(Error::Unavailable("ensemble has no members".into()));
        }
        let total = self.total_weight();
        let mut weighted = 0.0;
        for member in &self.members {
            let d = member.oracle.distance(a, b).await?;
            weighted += d * member.weight;
        }
        Ok(weighted / total)
    }
}
