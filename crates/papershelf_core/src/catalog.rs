//! crates/papershelf_core/src/catalog.rs
//!
//! The bundled list of categorized exam papers the app browses. Content
//! ships with the binary; the catalog never changes at runtime.

use crate::domain::Paper;

/// An in-memory, read-only collection of exam papers.
pub struct PaperCatalog {
    papers: Vec<Paper>,
}

fn paper(id: &str, title: &str, subject: &str, grade_level: &str, year: u16) -> Paper {
    Paper {
        id: id.to_string(),
        title: title.to_string(),
        subject: subject.to_string(),
        grade_level: grade_level.to_string(),
        year,
    }
}

impl PaperCatalog {
    /// The list bundled with the app.
    pub fn builtin() -> Self {
        Self {
            papers: vec![
                paper("math-olevel-2021-p1", "Mathematics Paper 1", "Mathematics", "O-Level", 2021),
                paper("math-olevel-2022-p2", "Mathematics Paper 2", "Mathematics", "O-Level", 2022),
                paper("math-alevel-2022-pure", "Pure Mathematics", "Mathematics", "A-Level", 2022),
                paper("phys-olevel-2021-p1", "Physics Paper 1", "Physics", "O-Level", 2021),
                paper("phys-alevel-2023-p2", "Physics Paper 2", "Physics", "A-Level", 2023),
                paper("chem-olevel-2022-p1", "Chemistry Paper 1", "Chemistry", "O-Level", 2022),
                paper("chem-alevel-2021-org", "Organic Chemistry", "Chemistry", "A-Level", 2021),
                paper("bio-g10-2023-p1", "Biology Paper 1", "Biology", "10", 2023),
                paper("bio-alevel-2022-p2", "Biology Paper 2", "Biology", "A-Level", 2022),
                paper("eng-g10-2021-comp", "English Composition", "English", "10", 2021),
                paper("eng-olevel-2023-lit", "English Literature", "English", "O-Level", 2023),
                paper("math-uni-2023-calc", "Calculus I Final", "Mathematics", "University", 2023),
            ],
        }
    }

    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    pub fn get(&self, id: &str) -> Option<&Paper> {
        self.papers.iter().find(|p| p.id == id)
    }

    /// The distinct subjects, sorted.
    pub fn subjects(&self) -> Vec<String> {
        let mut subjects: Vec<String> = self.papers.iter().map(|p| p.subject.clone()).collect();
        subjects.sort();
        subjects.dedup();
        subjects
    }

    pub fn by_subject(&self, subject: &str) -> Vec<&Paper> {
        self.papers
            .iter()
            .filter(|p| p.subject.eq_ignore_ascii_case(subject))
            .collect()
    }

    /// Case-insensitive substring match over title and subject. A blank
    /// query returns everything.
    pub fn search(&self, query: &str) -> Vec<&Paper> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.papers.iter().collect();
        }
        self.papers
            .iter()
            .filter(|p| {
                p.title.to_lowercase().contains(&needle)
                    || p.subject.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_case_insensitive_over_title_and_subject() {
        let catalog = PaperCatalog::builtin();
        let by_title = catalog.search("pure mathematics");
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].id, "math-alevel-2022-pure");

        let by_subject = catalog.search("CHEMISTRY");
        assert!(by_subject.len() >= 2);
        assert!(by_subject.iter().all(|p| p.subject == "Chemistry"));
    }

    #[test]
    fn blank_query_returns_the_full_list() {
        let catalog = PaperCatalog::builtin();
        assert_eq!(catalog.search("   ").len(), catalog.papers().len());
    }

    #[test]
    fn by_subject_filters_exactly() {
        let catalog = PaperCatalog::builtin();
        let physics = catalog.by_subject("physics");
        assert!(!physics.is_empty());
        assert!(physics.iter().all(|p| p.subject == "Physics"));
    }

    #[test]
    fn subjects_are_distinct_and_sorted() {
        let catalog = PaperCatalog::builtin();
        let subjects = catalog.subjects();
        let mut sorted = subjects.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(subjects, sorted);
        assert!(subjects.contains(&"Biology".to_string()));
    }

    #[test]
    fn get_finds_by_id() {
        let catalog = PaperCatalog::builtin();
        assert!(catalog.get("eng-g10-2021-comp").is_some());
        assert!(catalog.get("missing").is_none());
    }
}
