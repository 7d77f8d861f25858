/// Identifies one feedback loop of a pipeline. The invocation id keeps
/// loops of different job submissions apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedbackKey {
    pub pipeline: String,
    pub invocation: u64,
}

impl FeedbackKey {
    pub fn new(pipeline: impl Into<String>, invocation: u64) -> Self {
        Self {
            pipeline: pipeline.into(),
            invocation,
        }
    }

    /// Key the host scheduler groups the loop's stages under.
    pub fn colocation_key(&self) -> String {
        format!("{}-{}", self.pipeline, self.invocation)
    }
}

/// Placement constraint handed to the host scheduler, not enforced here:
/// the merge, dispatch and write-back stages of one feedback loop must run
/// with identical parallelism inside one co-location group, so that the
/// per-partition feedback buffer is reachable without cross-worker
/// communication on the loop-back path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementSpec {
    pub colocation_key: String,
    pub parallelism: usize,
}

impl PlacementSpec {
    pub fn aligned(key: &FeedbackKey, parallelism: usize) -> Self {
        Self {
            colocation_key: key.colocation_key(),
            parallelism,
        }
    }
}
