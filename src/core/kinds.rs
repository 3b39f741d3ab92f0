//! core::kinds
//!
//! Closed enumerations for the string-typed `type` fields of command
//! documents.
//!
//! Every enumeration keeps its wire form as a string. Strings that do not
//! name a known variant are kept in an `Unknown` variant instead of failing
//! deserialization, so the validator can report them alongside every other
//! problem in the document.

use serde::{Deserialize, Serialize};

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A wire value that names no known variant.
            Unknown(String),
        }

        impl $name {
            /// Canonical wire names of the known variants.
            pub const KNOWN: &'static [&'static str] = &[$($wire),+];

            /// Look up a variant by wire name.
            pub fn parse(raw: &str) -> Self {
                match raw {
                    $( $wire $(| $alias)* => Self::$variant, )+
                    other => Self::Unknown(other.to_string()),
                }
            }

            /// The canonical wire name.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Unknown(raw) => raw,
                }
            }

            /// Whether this is a recognized variant.
            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self::parse(&raw)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Kind of command.
    CommandType {
        Docker => "docker",
        /// Prepares files for a wrapper input before the main command runs.
        DockerSetup => "docker-setup",
        /// Post-processes an output before it is uploaded.
        DockerWrapup => "docker-wrapup",
    }
}

impl CommandType {
    /// Setup and wrapup commands are launched by the system, not by users.
    pub fn is_setup_or_wrapup(&self) -> bool {
        matches!(self, CommandType::DockerSetup | CommandType::DockerWrapup)
    }
}

impl Default for CommandType {
    fn default() -> Self {
        CommandType::Docker
    }
}

wire_enum! {
    /// Type of a command input.
    CommandInputType {
        String => "string",
        Boolean => "boolean",
        Number => "number",
        File => "file",
        Select => "select-one",
        MultiSelect => "select-many",
    }
}

impl CommandInputType {
    /// Whether values are picked from a list of select values.
    pub fn is_select(&self) -> bool {
        matches!(self, CommandInputType::Select | CommandInputType::MultiSelect)
    }
}

impl Default for CommandInputType {
    fn default() -> Self {
        CommandInputType::String
    }
}

wire_enum! {
    /// Type of a wrapper input.
    WrapperInputType {
        String => "string",
        Boolean => "boolean",
        Number => "number",
        Directory => "Directory",
        File => "File",
        Files => "File[]",
        Project => "Project",
        ProjectAsset => "ProjectAsset",
        Subject => "Subject",
        SubjectAssessor => "SubjectAssessor",
        Session => "Session",
        Scan => "Scan",
        Assessor => "Assessor",
        Resource => "Resource",
        Config => "Config",
    }
}

impl Default for WrapperInputType {
    fn default() -> Self {
        WrapperInputType::String
    }
}

/// Object type of a project.
pub const PROJECT_DATA_TYPE: &str = "xnat:projectData";

/// Object type of a subject.
pub const SUBJECT_DATA_TYPE: &str = "xnat:subjectData";

impl WrapperInputType {
    /// Whether inputs of this type are external hierarchical objects that
    /// carry access permissions.
    pub fn is_object_type(&self) -> bool {
        matches!(
            self,
            WrapperInputType::Project
                | WrapperInputType::ProjectAsset
                | WrapperInputType::Subject
                | WrapperInputType::SubjectAssessor
                | WrapperInputType::Session
                | WrapperInputType::Scan
                | WrapperInputType::Assessor
                | WrapperInputType::Resource
        )
    }

    /// The concrete object type, when the wrapper type pins one down.
    ///
    /// Generic kinds (sessions, assessors, project assets) have many concrete
    /// subtypes and return `None`.
    pub fn concrete_object_type(&self) -> Option<&'static str> {
        match self {
            WrapperInputType::Project => Some(PROJECT_DATA_TYPE),
            WrapperInputType::Subject => Some(SUBJECT_DATA_TYPE),
            _ => None,
        }
    }
}

wire_enum! {
    /// Kind of object an output handler creates.
    OutputHandlerType {
        Scan => "scan" | "Scan",
        Assessor => "assessor" | "Assessor",
        Resource => "resource" | "Resource",
    }
}

impl Default for OutputHandlerType {
    fn default() -> Self {
        OutputHandlerType::Resource
    }
}

wire_enum! {
    /// How multiple values of one command input are joined on the command line.
    MultipleDelimiter {
        QuotedSpace => "quoted-space",
        Space => "space",
        Comma => "comma",
        Flag => "flag",
    }
}
