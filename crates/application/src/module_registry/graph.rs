use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    /// On the current traversal path.
    Gray,
    /// Fully emitted.
    Black,
}

struct Frame {
    module: Arc<dyn Module>,
    dependencies: Vec<Arc<dyn Module>>,
    next: usize,
}

impl Frame {
    fn new(module: Arc<dyn Module>) -> Self {
        let dependencies = module.dependencies();
        Self {
            module,
            dependencies,
            next: 0,
        }
    }
}

impl ModuleRegistry {
    /// Returns the transitive dependencies of a module followed by the module.
    ///
    /// Every module appears after everything it depends on and at most once.
    /// Traversal uses an explicit stack so deep acyclic graphs are not mistaken
    /// for cycles. A module reached again while still on the current path is a
    /// cycle and fails with the full path, e.g. `X -> Y -> X`.
    pub fn dependency_tree(&self, module_id: &str) -> AppResult<Vec<Arc<dyn Module>>> {
        let root = self.get(module_id).ok_or_else(|| {
            AppError::Configuration(format!(
                "cannot resolve dependencies of unregistered module '{module_id}'"
            ))
        })?;

        let mut visits: HashMap<String, Visit> = HashMap::new();
        let mut path: Vec<String> = Vec::new();
        let mut ordered: Vec<Arc<dyn Module>> = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();

        visits.insert(root.id().to_owned(), Visit::Gray);
        path.push(root.id().to_owned());
        stack.push(Frame::new(root));

        while let Some(frame) = stack.last_mut() {
            let Some(dependency) = frame.dependencies.get(frame.next).cloned() else {
                if let Some(done) = stack.pop() {
                    visits.insert(done.module.id().to_owned(), Visit::Black);
                    path.pop();
                    ordered.push(done.module);
                }
                continue;
            };
            frame.next += 1;

            match visits.get(dependency.id()) {
                Some(Visit::Black) => {}
                Some(Visit::Gray) => {
                    return Err(AppError::Configuration(format!(
                        "module dependency cycle detected: {}",
                        cycle_path(&path, dependency.id())
                    )));
                }
                None => {
                    visits.insert(dependency.id().to_owned(), Visit::Gray);
                    path.push(dependency.id().to_owned());
                    stack.push(Frame::new(dependency));
                }
            }
        }

        Ok(ordered)
    }
}

fn cycle_path(path: &[String], repeated: &str) -> String {
    let start = path
        .iter()
        .position(|module_id| module_id == repeated)
        .unwrap_or_default();

    path[start..]
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(repeated))
        .collect::<Vec<_>>()
        .join(" -> ")
}
