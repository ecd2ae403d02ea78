/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AttributeConfig {
    /// Maximum depth followed by the cycle check before a new dependency is
    /// rejected. Cascades are not limited by it.
    pub max_graph_depth: usize,

    /// Highest modifier ID handed out by an owner before the counter wraps
    /// and IDs are recycled from the gaps left by removed modifiers.
    pub max_modifier_id: u32,
}

impl AttributeConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum number of attributes a single modifier may read.
    pub const MAX_OBSERVED_ATTRIBUTES: usize = 42;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_GRAPH_DEPTH: usize = 256;
    pub const DEFAULT_MAX_MODIFIER_ID: u32 = u32::MAX;

    pub fn new() -> Self {
        Self {
            max_graph_depth: Self::DEFAULT_MAX_GRAPH_DEPTH,
            max_modifier_id: Self::DEFAULT_MAX_MODIFIER_ID,
        }
    }

    pub fn with_max_graph_depth(mut self, max_graph_depth: usize) -> Self {
        self.max_graph_depth = max_graph_depth;
        self
    }

    pub fn with_max_modifier_id(mut self, max_modifier_id: u32) -> Self {
        self.max_modifier_id = max_modifier_id.max(1);
        self
    }
}

impl Default for AttributeConfig {
    fn default() -> Self {
        Self::new()
    }
}
