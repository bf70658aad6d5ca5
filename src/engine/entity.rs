//! Entity - A live component instance.
//!
//! Owns the component object, its current state and props, the last
//! rendered tree, the native node that tree produced, and the child entities
//! it rendered, keyed by the path of the component node that produced them.

use std::collections::BTreeMap;
use std::fmt;

use crate::component::{Component, ComponentType};
use crate::native::NativeId;
use crate::types::{EntityId, Props, State};
use crate::vdom::{Path, Tree};

bitflags::bitflags! {
    /// Lifecycle flags of an entity.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntityFlags: u8 {
        const NONE = 0;
        /// `after_mount` has run.
        const MOUNTED = 1 << 0;
        /// Teardown has started. Guards against unmounting twice.
        const UNMOUNTING = 1 << 1;
    }
}

pub struct Entity {
    pub id: EntityId,
    pub component_type: ComponentType,
    pub component: Box<dyn Component>,
    pub state: State,
    pub props: Props,
    /// Last rendered tree.
    pub tree: Tree,
    /// Native node produced for the tree root. Shared with the child entity
    /// when the tree root is itself a component.
    pub native_root: Option<NativeId>,
    /// Child entities by the path of the component node that rendered them.
    pub children: BTreeMap<Path, EntityId>,
    pub parent: Option<EntityId>,
    pub flags: EntityFlags,
}

impl Entity {
    pub fn new(
        id: EntityId,
        component_type: ComponentType,
        component: Box<dyn Component>,
        state: State,
        props: Props,
        tree: Tree,
        parent: Option<EntityId>,
    ) -> Self {
        Self {
            id,
            component_type,
            component,
            state,
            props,
            tree,
            native_root: None,
            children: BTreeMap::new(),
            parent,
            flags: EntityFlags::NONE,
        }
    }

    /// Child entities rendered at or below `path`.
    pub fn children_within(&self, path: &Path) -> Vec<(Path, EntityId)> {
        self.children
            .range(path.clone()..)
            .take_while(|(child_path, _)| child_path.is_within(path))
            .map(|(child_path, id)| (child_path.clone(), *id))
            .collect()
    }

    pub fn is_mounted(&self) -> bool {
        self.flags.contains(EntityFlags::MOUNTED)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("type", &self.component_type.name())
            .field("state", &self.state)
            .field("props", &self.props)
            .field("native_root", &self.native_root)
            .field("children", &self.children)
            .field("flags", &self.flags)
            .finish()
    }
}
