use super::PipelineError;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const CPP_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++", "h", "hh", "hpp", "hxx", "ipp", "inl"];

/// Lexicon a unit is classified with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    CMake,
    Cpp,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::CMake => "cmake",
            Language::Cpp => "cpp",
        }
    }

    /// Infer from a file name: `CMakeLists.txt` and `*.cmake` are CMake,
    /// C and C++ source and header extensions are C++.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        let file_name = path.file_name()?.to_str()?;

        if file_name.eq_ignore_ascii_case("CMakeLists.txt") {
            return Some(Language::CMake);
        }

        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if extension == "cmake" {
            Some(Language::CMake)
        } else if CPP_EXTENSIONS.contains(&extension.as_str()) {
            Some(Language::Cpp)
        } else {
            None
        }
    }
}

impl FromStr for Language {
    type Err = PipelineError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "cmake" => Ok(Language::CMake),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            _ => Err(PipelineError::UnknownLanguage {
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
