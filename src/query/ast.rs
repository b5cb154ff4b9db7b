//! Syntax tree types for path queries.

use std::fmt;

/// A single named property segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    id: String,
}

impl Step {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The property key this step selects.
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// An ordered sequence of components, the `.`-joined segments of one alternative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    components: Vec<PathComponent>,
}

impl Path {
    pub fn new(components: Vec<PathComponent>) -> Self {
        Self { components }
    }

    pub fn push(&mut self, component: PathComponent) {
        self.components.push(component);
    }

    pub fn components(&self) -> &[PathComponent] {
        &self.components
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }
}

/// An ordered list of alternative paths, the `|`-joined options of a query
/// or of a bracketed group.
///
/// Reads return the first alternative that resolves; writes always target the
/// first alternative.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Switch {
    paths: Vec<Path>,
}

impl Switch {
    pub fn new(paths: Vec<Path>) -> Self {
        Self { paths }
    }

    pub fn push(&mut self, path: Path) {
        self.paths.push(path);
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

/// A component of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathComponent {
    /// Named property (`name`)
    Step(Step),
    /// Nested sequence of components
    Path(Path),
    /// Bracketed alternation (`[a|b]`)
    Switch(Switch),
}

impl From<Step> for PathComponent {
    fn from(step: Step) -> Self {
        PathComponent::Step(step)
    }
}

impl From<Path> for PathComponent {
    fn from(path: Path) -> Self {
        PathComponent::Path(path)
    }
}

impl From<Switch> for PathComponent {
    fn from(switch: Switch) -> Self {
        PathComponent::Switch(switch)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.components.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

/// Prints the alternatives without brackets, i.e. as a top-level query.
impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.paths.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            write!(f, "{}", path)?;
        }
        Ok(())
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathComponent::Step(step) => write!(f, "{}", step),
            PathComponent::Path(path) => write!(f, "{}", path),
            PathComponent::Switch(switch) => write!(f, "[{}]", switch),
        }
    }
}
