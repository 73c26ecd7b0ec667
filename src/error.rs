use wasm_bindgen::JsValue;

#[derive(Debug, thiserror::Error)]
pub enum GpxError {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML write error: {0}")]
    XmlWrite(String),

    #[error("Expected a file name ending in .gpx, got '{0}'")]
    InvalidExtension(String),

    #[error("Document has no root element")]
    EmptyDocument,

    #[error("Root element is <{0}>, expected <gpx>")]
    NotGpx(String),

    #[error("Root <gpx> element has no namespace")]
    MissingNamespace,

    #[error("Document failed schema validation")]
    SchemaInvalid,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid JSON value for '{key}': {reason}")]
    InvalidJson { key: &'static str, reason: String },

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<GpxError> for JsValue {
    fn from(e: GpxError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
