use std::collections::HashMap;

/// A project (repository) in the remote tracker that issues can be filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: u64,
    pub path_with_namespace: String,
    pub name: String,
    pub path: String,
    pub web_url: String,
}

/// Case-insensitive project lookup by full path, name, or short path.
///
/// All three key spaces share one map, filled per project in the order
/// full path, name, short path. A key claimed twice resolves to the project
/// inserted last.
#[derive(Debug, Clone, Default)]
pub struct ProjectCatalog {
    projects: Vec<Project>,
    by_key: HashMap<String, usize>,
}

impl ProjectCatalog {
    pub fn new(projects: Vec<Project>) -> Self {
        let mut by_key = HashMap::new();
        for (index, project) in projects.iter().enumerate() {
            for key in [&project.path_with_namespace, &project.name, &project.path] {
                by_key.insert(key.to_lowercase(), index);
            }
        }
        Self { projects, by_key }
    }

    /// `value` is trimmed and lowercased before probing.
    pub fn resolve(&self, value: &str) -> Option<&Project> {
        self.by_key
            .get(&value.trim().to_lowercase())
            .and_then(|&index| self.projects.get(index))
    }
}
