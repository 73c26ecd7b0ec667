use serde::Deserialize;

/// Namespace of GPX 1.1 documents.
pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

/// Options shared by the serializer, the JSON codec and the JS entry points.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GpxOptions {
    /// Start/end tolerance in meters for the `loop` flag of route and track summaries (default: 10)
    #[serde(default = "default_loop_delta")]
    pub loop_delta: f64,

    /// Spaces per nesting level when writing GPX, 0 writes everything on one line (default: 2)
    #[serde(default = "default_indent")]
    pub indent: usize,

    /// Namespace given to documents decoded from JSON (default: GPX 1.1)
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

impl Default for GpxOptions {
    fn default() -> Self {
        Self {
            loop_delta: default_loop_delta(),
            indent: default_indent(),
            namespace: default_namespace(),
        }
    }
}

fn default_loop_delta() -> f64 {
    10.0
}

fn default_indent() -> usize {
    2
}

fn default_namespace() -> String {
    GPX_NAMESPACE.to_string()
}
