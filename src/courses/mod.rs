//! Course store module
//!
//! Holds the seeded course catalogue. The store is built once at startup and
//! only ever read afterwards, so it is shared by `Arc` without locking.

use serde::{Deserialize, Serialize};

/// A single course record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Opaque identifier, compared as text only
    pub id: String,
    pub name: String,
    pub credits: i64,
}

impl Course {
    pub fn new(id: &str, name: &str, credits: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            credits,
        }
    }
}

/// Read-only, insertion-ordered course collection
#[derive(Debug, Clone, Default)]
pub struct CourseStore {
    courses: Vec<Course>,
}

impl CourseStore {
    pub const fn new(courses: Vec<Course>) -> Self {
        Self { courses }
    }

    /// Store populated with the four built-in courses
    pub fn seeded() -> Self {
        Self::new(vec![
            Course::new("8108255", "Programación-I", 4),
            Course::new("8108256", "Programación-II", 4),
            Course::new("8108257", "Programación-III", 4),
            Course::new("8108277", "Electiva-II", 3),
        ])
    }

    /// All courses in seed order
    pub fn list_all(&self) -> &[Course] {
        &self.courses
    }

    /// First course whose id equals `id` exactly
    pub fn find_by_id(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|course| course.id == id)
    }
}
