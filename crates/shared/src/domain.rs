use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(FacultyId);
id_newtype!(DepartmentId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRecord {
    pub department_id: DepartmentId,
    pub department_name: String,
}

/// Department columns embedded alongside a faculty row by the store join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentRef {
    pub department_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyRecord {
    pub faculty_id: FacultyId,
    pub name: String,
    #[serde(default)]
    pub designation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_link: Option<String>,
    pub department_id: DepartmentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<DepartmentRef>,
}

impl FacultyRecord {
    pub fn department_name(&self) -> Option<&str> {
        self.department
            .as_ref()
            .map(|department| department.department_name.as_str())
    }

    /// Short department label: the first two words of the joined name.
    pub fn department_badge(&self) -> String {
        self.department_name()
            .map(|name| name.split_whitespace().take(2).collect::<Vec<_>>().join(" "))
            .unwrap_or_default()
    }

    pub fn has_active_profile(&self) -> bool {
        self.email
            .as_deref()
            .is_some_and(|email| !email.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySummary {
    pub total_faculty: usize,
    pub departments: usize,
    pub active_profiles: usize,
}

impl DirectorySummary {
    pub fn from_records(faculty: &[FacultyRecord], departments: &[DepartmentRecord]) -> Self {
        Self {
            total_faculty: faculty.len(),
            departments: departments.len(),
            active_profiles: faculty.iter().filter(|f| f.has_active_profile()).count(),
        }
    }
}
