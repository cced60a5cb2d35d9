//! Tool lists advertised by the backend.
//!
//! Import tools gate which file types the client accepts, export tools become
//! the choices of the export menu. Transformation tools are only listed.

/// Offered when the backend does not advertise any export formats.
pub const DEFAULT_EXPORT_FORMATS: [&str; 3] = ["csv", "json", "xlsx"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolRegistry {
    import_tools: Vec<String>,
    transformation_tools: Vec<String>,
    export_tools: Vec<String>,
    loaded: bool,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn import_tools(&self) -> &[String] {
        &self.import_tools
    }

    pub fn transformation_tools(&self) -> &[String] {
        &self.transformation_tools
    }

    pub fn export_tools(&self) -> &[String] {
        &self.export_tools
    }

    /// Export formats to offer, falling back to [`DEFAULT_EXPORT_FORMATS`].
    pub fn export_formats(&self) -> Vec<String> {
        if self.export_tools.is_empty() {
            DEFAULT_EXPORT_FORMATS.iter().map(|f| (*f).to_owned()).collect()
        } else {
            self.export_tools.clone()
        }
    }

    /// True once at least one list has been fetched.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn set_import_tools(&mut self, tools: Vec<String>) {
        self.import_tools = tools;
        self.loaded = true;
    }

    pub fn set_transformation_tools(&mut self, tools: Vec<String>) {
        self.transformation_tools = tools;
        self.loaded = true;
    }

    pub fn set_export_tools(&mut self, tools: Vec<String>) {
        self.export_tools = tools;
        self.loaded = true;
    }
}
