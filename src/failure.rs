use serde::{Serialize, Serializer};
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use crate::kind::ErrorKind;

/// Result of every filesystem operation in this crate. `Ok(())` means done.
pub type Outcome = Result<(), Failure>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Str(String),
    Int(i32),
    /// Kept as raw bytes; only display and serialization convert it.
    #[serde(serialize_with = "serialize_path")]
    Path(PathBuf),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Path(value) => write!(f, "{}", value.display()),
        }
    }
}

// UTF-8 paths serialize as strings, anything else as its byte array so the
// exact name survives a round trip through JSON.
fn serialize_path<S>(path: &Path, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match path.to_str() {
        Some(text) => serializer.serialize_str(text),
        None => path.as_os_str().as_bytes().serialize(serializer),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

/// A classified filesystem failure plus the attributes describing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Failure {
    context: String,
    kind: ErrorKind,
    code: i32,
    attributes: Vec<Attribute>,
}

impl Failure {
    pub(crate) fn new(context: &str, kind: ErrorKind) -> Self {
        Self {
            context: context.to_string(),
            kind,
            code: kind.code(),
            attributes: Vec::new(),
        }
    }

    // Setting an existing name replaces its value in place.
    pub(crate) fn set_attribute(&mut self, name: &str, value: AttributeValue) {
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub(crate) fn with_string(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, AttributeValue::Str(value.into()));
        self
    }

    pub(crate) fn with_path(mut self, name: &str, value: &Path) -> Self {
        self.set_attribute(name, AttributeValue::Path(value.to_path_buf()));
        self
    }

    pub(crate) fn with_int(mut self, name: &str, value: i32) -> Self {
        self.set_attribute(name, AttributeValue::Int(value));
        self
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message code of the kind, see [`ErrorKind::code`].
    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }

    pub fn path(&self) -> Option<&Path> {
        match self.attribute("path") {
            Some(AttributeValue::Path(value)) => Some(value),
            _ => None,
        }
    }

    pub fn errstr(&self) -> Option<&str> {
        match self.attribute("errstr") {
            Some(AttributeValue::Str(value)) => Some(value),
            _ => None,
        }
    }

    pub fn errno(&self) -> Option<i32> {
        match self.attribute("errno") {
            Some(AttributeValue::Int(value)) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.kind)?;
        if let Some(path) = self.path() {
            write!(f, " path={}", path.display())?;
        }
        if let Some(errno) = self.errno() {
            write!(f, " errno={}", errno)?;
        }
        Ok(())
    }
}

impl std::error::Error for Failure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_keep_insertion_order_and_replace_in_place() {
        let failure = Failure::new("OS:Files", ErrorKind::NoSuchFile)
            .with_path("path", Path::new("/tmp/a"))
            .with_int("errno", 2)
            .with_path("path", Path::new("/tmp/b"));

        let names: Vec<&str> = failure
            .attributes()
            .iter()
            .map(|attr| attr.name.as_str())
            .collect();
        assert_eq!(names, vec!["path", "errno"]);
        assert_eq!(failure.path(), Some(Path::new("/tmp/b")));
        assert_eq!(failure.errno(), Some(2));
        assert_eq!(failure.errstr(), None);
    }

    #[test]
    fn display_names_context_kind_and_path() {
        let failure = Failure::new("OS:Files", ErrorKind::AccessDenied)
            .with_path("path", Path::new("/root/x"))
            .with_int("errno", 13);
        assert_eq!(
            failure.to_string(),
            "OS:Files: access_denied path=/root/x errno=13"
        );
    }

    #[test]
    fn serializes_attribute_values_untagged() {
        let failure = Failure::new("OS:Files", ErrorKind::FileBusy)
            .with_path("path", Path::new("/mnt"))
            .with_int("errno", 16);
        let json = serde_json::to_value(&failure).expect("serialize failure");
        assert_eq!(json["kind"], "file_busy");
        assert_eq!(json["code"], 4);
        assert_eq!(json["attributes"][0]["value"], "/mnt");
        assert_eq!(json["attributes"][1]["value"], 16);
    }

    #[test]
    fn non_utf8_path_keeps_its_bytes() {
        use std::ffi::OsStr;

        let raw = Path::new(OsStr::from_bytes(b"/tmp/\xff\xfe"));
        let failure = Failure::new("OS:Files", ErrorKind::NoSuchFile).with_path("path", raw);

        assert_eq!(
            failure.path().map(|p| p.as_os_str().as_bytes()),
            Some(&b"/tmp/\xff\xfe"[..])
        );
        let json = serde_json::to_value(&failure).expect("serialize failure");
        assert_eq!(
            json["attributes"][0]["value"],
            serde_json::json!([47, 116, 109, 112, 47, 255, 254])
        );
    }
}
