use crate::ident::sanitize;
use crate::model::{Entity, Runtime, VarKind};

const INSTANCE_SIGIL: char = '@';
const GLOBAL_SIGIL: char = '$';

/// Resolves a variable or list id to the identifier emitted for it.
///
/// The stage only sees its own entries and emits them as globals (`$name`). A sprite
/// checks its own entries first (`@name`) and then the stage's (`$name`). An id found
/// locally with the wrong kind stops the lookup: the stage is never consulted for it.
/// `None` means the id is unknown or names the other kind.
pub fn resolve_name<R: Runtime + ?Sized>(
    kind: VarKind,
    entity: &Entity,
    runtime: &R,
    id: &str,
) -> Option<String> {
    if entity.is_stage {
        return sigiled(GLOBAL_SIGIL, kind, entity, id);
    }
    if let Some(local) = entity.lookup(id) {
        if local.kind() != kind {
            return None;
        }
        return Some(format!("{}{}", INSTANCE_SIGIL, sanitize(local.name())));
    }
    let stage = runtime.stage()?;
    sigiled(GLOBAL_SIGIL, kind, stage, id)
}

pub fn variable_name<R: Runtime + ?Sized>(
    entity: &Entity,
    runtime: &R,
    id: &str,
) -> Option<String> {
    resolve_name(VarKind::Scalar, entity, runtime, id)
}

pub fn list_name<R: Runtime + ?Sized>(
    entity: &Entity,
    runtime: &R,
    id: &str,
) -> Option<String> {
    resolve_name(VarKind::List, entity, runtime, id)
}

/// Statement emitters run inside the entity's own class body, so it is always `self`.
pub fn sprite_name() -> &'static str {
    "self"
}

fn sigiled(sigil: char, kind: VarKind, owner: &Entity, id: &str) -> Option<String> {
    let entry = owner.lookup(id).filter(|entry| entry.kind() == kind)?;
    Some(format!("{}{}", sigil, sanitize(entry.name())))
}
