/// Configuration for construction validation and assignment.
#[derive(Debug, Clone)]
pub struct AssignConfig {
    /// Absolute tolerance applied per property when deduplicating materials.
    pub dedup_tolerance: f64,
    /// Accepted range for the sum of path fractions (inclusive).
    pub min_path_fraction_sum: f64,
    pub max_path_fraction_sum: f64,
    /// Name prefix marking a reversed construction assigned to an adjacent surface.
    ///
    /// A construction already carrying the prefix is mirrored back to the
    /// unprefixed name.
    pub reversed_prefix: String,
}

impl AssignConfig {
    pub fn new() -> Self {
        Self {
            dedup_tolerance: 1e-4,
            min_path_fraction_sum: 0.99,
            max_path_fraction_sum: 1.01,
            reversed_prefix: "Rev".to_string(),
        }
    }

    /// Name given to the mirrored counterpart of construction `name`.
    pub fn reversed_name(&self, name: &str) -> String {
        match name.strip_prefix(self.reversed_prefix.as_str()) {
            Some(stripped) => stripped.to_string(),
            None => format!("{}{}", self.reversed_prefix, name),
        }
    }
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self::new()
    }
}
