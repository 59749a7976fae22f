use crate::literal::Literal;
use indexmap::IndexMap;

pub const DEFAULT_DIRECTION: f64 = 90.0;
pub const DEFAULT_SIZE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Scalar,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStyle {
    #[default]
    AllAround,
    LeftRight,
    DontRotate,
}

impl RotationStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            RotationStyle::AllAround => "all around",
            RotationStyle::LeftRight => "left-right",
            RotationStyle::DontRotate => "don't rotate",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "all around" => Some(RotationStyle::AllAround),
            "left-right" => Some(RotationStyle::LeftRight),
            "don't rotate" => Some(RotationStyle::DontRotate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Costume {
    pub asset_id: String,
    pub name: String,
    pub bitmap_resolution: f64,
    pub md5: String,
    pub data_format: String,
    pub rotation_center_x: f64,
    pub rotation_center_y: f64,
}

/// Either side of an entity's variable mapping. An id names exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum VarEntry {
    Scalar { name: String, value: Literal },
    List { name: String, items: Vec<Literal> },
}

impl VarEntry {
    pub fn scalar(name: impl Into<String>, value: impl Into<Literal>) -> Self {
        VarEntry::Scalar {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn list(name: impl Into<String>, items: Vec<Literal>) -> Self {
        VarEntry::List {
            name: name.into(),
            items,
        }
    }

    pub fn kind(&self) -> VarKind {
        match self {
            VarEntry::Scalar { .. } => VarKind::Scalar,
            VarEntry::List { .. } => VarKind::List,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            VarEntry::Scalar { name, .. } | VarEntry::List { name, .. } => name,
        }
    }

    /// Scalars default to `0`, lists to the empty sequence.
    pub fn is_default(&self) -> bool {
        match self {
            VarEntry::Scalar { value, .. } => *value == Literal::Number(0.0),
            VarEntry::List { items, .. } => items.is_empty(),
        }
    }
}

/// Read-only snapshot of a sprite or the stage.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub is_stage: bool,
    pub x: f64,
    pub y: f64,
    pub direction: f64,
    pub visible: bool,
    pub size: f64,
    pub costumes: Vec<Costume>,
    /// 1-based, as the editor presents it.
    pub current_costume: usize,
    pub rotation_style: RotationStyle,
    pub variables: IndexMap<String, VarEntry>,
}

impl Entity {
    pub fn sprite(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_stage: false,
            x: 0.0,
            y: 0.0,
            direction: DEFAULT_DIRECTION,
            visible: true,
            size: DEFAULT_SIZE,
            costumes: Vec::new(),
            current_costume: 1,
            rotation_style: RotationStyle::AllAround,
            variables: IndexMap::new(),
        }
    }

    pub fn stage(name: impl Into<String>) -> Self {
        Self {
            is_stage: true,
            ..Self::sprite(name)
        }
    }

    pub fn lookup(&self, id: &str) -> Option<&VarEntry> {
        self.variables.get(id)
    }

    pub fn entries_of(&self, kind: VarKind) -> impl Iterator<Item = &VarEntry> + '_ {
        self.variables.values().filter(move |entry| entry.kind() == kind)
    }
}

/// Source of the stage entity for global lookups.
pub trait Runtime {
    fn stage(&self) -> Option<&Entity>;
}

/// A loaded project: the stage and sprites in layer order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub targets: Vec<Entity>,
}

impl Project {
    pub fn new(targets: Vec<Entity>) -> Self {
        Self { targets }
    }

    pub fn sprites(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.targets.iter().filter(|t| !t.is_stage)
    }

    pub fn find_target(&self, name: &str) -> Option<&Entity> {
        self.targets
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }
}

impl Runtime for Project {
    fn stage(&self) -> Option<&Entity> {
        self.targets.iter().find(|t| t.is_stage)
    }
}

/// A runtime that has no stage; every global lookup misses.
pub struct NoStage;

impl Runtime for NoStage {
    fn stage(&self) -> Option<&Entity> {
        None
    }
}
