use crate::dataset::DatasetId;

/// Pages of the shell, addressed by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Route {
    #[default]
    Import,
    Datasets,
    Spreadsheet(DatasetId),
}

impl Route {
    /// `/` and the empty path resolve to [`Route::Import`]; unknown paths to `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim().trim_end_matches('/');
        match trimmed {
            "" | "/import" => Some(Self::Import),
            "/datasets" => Some(Self::Datasets),
            _ => {
                let id = trimmed.strip_prefix("/spreadsheet/")?;
                (!id.is_empty()).then(|| Self::Spreadsheet(DatasetId::from(id)))
            }
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Import => "/import".to_owned(),
            Self::Datasets => "/datasets".to_owned(),
            Self::Spreadsheet(id) => format!("/spreadsheet/{id}"),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Import => "Import",
            Self::Datasets => "Datasets",
            Self::Spreadsheet(_) => "Spreadsheet",
        }
    }
}
