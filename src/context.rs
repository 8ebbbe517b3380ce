use crate::failure::Failure;
use crate::kind::ErrorKind;

pub const DEFAULT_CONTEXT_NAME: &str = "OS:Files";
pub const DEFAULT_EOL: &str = "\n";

/// Names the message domain of this module's failures and renders their
/// display templates.
///
/// Built once by the owning process and handed to [`crate::Files`] or the
/// free functions; there is no global registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorContext {
    name: String,
    eol: String,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_NAME)
    }
}

impl ErrorContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            eol: DEFAULT_EOL.to_string(),
        }
    }

    pub fn with_eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn eol(&self) -> &str {
        &self.eol
    }

    pub fn failure(&self, kind: ErrorKind) -> Failure {
        Failure::new(&self.name, kind)
    }

    pub fn template_for(kind: ErrorKind) -> &'static str {
        match kind {
            ErrorKind::AccessDenied => "No write permission for parent directory",
            ErrorKind::FileExists => "A file of this name already exists",
            ErrorKind::WriteError => "Write error",
            ErrorKind::FileBusy => "File in use",
            ErrorKind::NoSuchFile => "File does not exist",
        }
    }

    /// Codes that belong to no kind have no template.
    pub fn template_for_code(code: i32) -> Option<&'static str> {
        ErrorKind::from_code(code).map(Self::template_for)
    }

    /// Template sentence plus one `name=${name}` placeholder line per
    /// attribute, in attribute order.
    pub fn render(&self, failure: &Failure) -> (String, Vec<String>) {
        let template = Self::template_for_code(failure.code())
            .unwrap_or_default()
            .to_string();
        (template, attribute_lines(failure))
    }

    /// [`ErrorContext::render`] joined into one text, each attribute line
    /// preceded by the end-of-line marker.
    pub fn template_text(&self, failure: &Failure) -> String {
        let (template, lines) = self.render(failure);
        self.join(template, &lines)
    }

    pub(crate) fn join(&self, mut template: String, lines: &[String]) -> String {
        for line in lines {
            template.push_str(&self.eol);
            template.push_str(line);
        }
        template
    }
}

pub(crate) fn attribute_lines(failure: &Failure) -> Vec<String> {
    failure
        .attributes()
        .iter()
        .map(|attr| format!("{name}=${{{name}}}", name = attr.name))
        .collect()
}
