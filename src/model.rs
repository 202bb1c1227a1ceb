//! The type AST — the bridge between the castxml dump and downstream
//! consumers.
//!
//! Nodes live in a [`TypeArena`] and reference each other through [`TypeId`]
//! handles. An edge is an index, not a pointer, which is what lets self- and
//! mutually-referential C types form cycles without ownership cycles.

use std::collections::HashMap;

/// Handle to one node in a [`TypeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

/// One node of the type AST.
#[derive(Debug)]
pub enum TypeNode {
    Fundamental(FundamentalDef),
    Pointer(PointerDef),
    Array(ArrayDef),
    CvQualified(CvQualifiedDef),
    Typedef(TypedefDef),
    Struct(StructDef),
    Union(UnionDef),
    Field(FieldDef),
    Enum(EnumDef),
    Function(FunctionDef),
    Callback(CallbackDef),
    Unimplemented(UnimplementedDef),
}

/// A builtin C type such as `int` or `double`.
#[derive(Debug)]
pub struct FundamentalDef {
    pub name: String,
    pub size: usize,
    pub align: usize,
}

/// A pointer to another type.
#[derive(Debug)]
pub struct PointerDef {
    pub pointee: TypeId,
    pub size: usize,
    pub align: usize,
}

/// A fixed-bounds array: element type plus min/max index as the dumper
/// reports them.
#[derive(Debug)]
pub struct ArrayDef {
    pub element: TypeId,
    pub min: usize,
    pub max: usize,
}

/// A cv-qualified (`const`) view of another type.
#[derive(Debug)]
pub struct CvQualifiedDef {
    pub inner: TypeId,
}

/// A `typedef` alias.
#[derive(Debug)]
pub struct TypedefDef {
    pub name: String,
    pub aliased: TypeId,
}

/// Member storage of a struct or union.
///
/// Members start out as the raw id list captured from the dump and are
/// materialized into node handles exactly once, on first resolution. The
/// swap from `Pending` to `Resolved` happens before any member id is
/// dereferenced, which is what terminates mutually-recursive resolution: a
/// re-entrant read observes `Resolved` (possibly still filling) instead of
/// re-entering the member walk. Anonymous aggregate members are dropped
/// during materialization, matching the dumper's observed consumers.
#[derive(Debug)]
pub enum Members {
    Pending(Vec<String>),
    Resolved(Vec<TypeId>),
}

impl Members {
    /// The materialized member list; empty while still pending.
    pub fn resolved(&self) -> &[TypeId] {
        match self {
            Members::Resolved(members) => members,
            Members::Pending(_) => &[],
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Members::Resolved(_))
    }

    /// Swap `Pending` out, leaving an empty `Resolved` list in place.
    /// Returns `None` when already resolved.
    pub(crate) fn take_pending(&mut self) -> Option<Vec<String>> {
        if let Members::Pending(ids) = self {
            let ids = std::mem::take(ids);
            *self = Members::Resolved(Vec::new());
            Some(ids)
        } else {
            None
        }
    }

    pub(crate) fn push(&mut self, member: TypeId) {
        if let Members::Resolved(members) = self {
            members.push(member);
        }
    }
}

/// A C struct definition.
#[derive(Debug)]
pub struct StructDef {
    /// Empty for anonymous structs.
    pub name: String,
    pub size: usize,
    pub align: usize,
    pub members: Members,
}

/// A C union definition. Unions are frequently anonymous.
#[derive(Debug)]
pub struct UnionDef {
    pub name: Option<String>,
    pub size: usize,
    pub align: usize,
    pub variants: Members,
}

/// A single struct field or union variant.
#[derive(Debug)]
pub struct FieldDef {
    pub name: Option<String>,
    pub ty: TypeId,
}

/// A C enum definition.
#[derive(Debug)]
pub struct EnumDef {
    pub name: Option<String>,
    pub size: usize,
    pub align: usize,
    /// Enumerators in declaration order.
    pub values: Vec<EnumValue>,
}

/// A single enumerator.
#[derive(Debug)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

/// A free function declaration.
#[derive(Debug)]
pub struct FunctionDef {
    pub name: String,
    pub returns: TypeId,
    pub params: Vec<ParamDef>,
    pub flags: FunctionFlags,
}

/// A function-pointer type.
#[derive(Debug)]
pub struct CallbackDef {
    pub returns: TypeId,
    pub params: Vec<ParamDef>,
}

/// A function or callback parameter.
#[derive(Debug)]
pub struct ParamDef {
    pub name: Option<String>,
    pub ty: TypeId,
    /// Set on the last declared parameter when the signature ends in `...`.
    pub variadic: bool,
}

/// Function declaration flags.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FunctionFlags {
    pub inline: bool,
    pub is_static: bool,
    pub artificial: bool,
    pub is_extern: bool,
}

/// Fallback for dump elements castxml itself marks unimplemented.
#[derive(Debug)]
pub struct UnimplementedDef {
    /// The originating clang class name.
    pub type_class: String,
}

impl TypeNode {
    /// Short kind name, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            TypeNode::Fundamental(_) => "fundamental",
            TypeNode::Pointer(_) => "pointer",
            TypeNode::Array(_) => "array",
            TypeNode::CvQualified(_) => "cv-qualified",
            TypeNode::Typedef(_) => "typedef",
            TypeNode::Struct(_) => "struct",
            TypeNode::Union(_) => "union",
            TypeNode::Field(_) => "field",
            TypeNode::Enum(_) => "enum",
            TypeNode::Function(_) => "function",
            TypeNode::Callback(_) => "callback",
            TypeNode::Unimplemented(_) => "unimplemented",
        }
    }

    /// Declared name, for the kinds that carry one.
    ///
    /// `Some("")` distinguishes an anonymous aggregate (a name attribute
    /// that is empty or missing) from kinds with no name concept at all
    /// (`None`). Member shaping relies on that distinction: anonymous named
    /// kinds are dropped, nameless kinds pass through.
    pub fn name(&self) -> Option<&str> {
        match self {
            TypeNode::Fundamental(def) => Some(&def.name),
            TypeNode::Typedef(def) => Some(&def.name),
            TypeNode::Struct(def) => Some(&def.name),
            TypeNode::Union(def) => Some(def.name.as_deref().unwrap_or("")),
            TypeNode::Enum(def) => Some(def.name.as_deref().unwrap_or("")),
            TypeNode::Field(def) => Some(def.name.as_deref().unwrap_or("")),
            TypeNode::Function(def) => Some(&def.name),
            TypeNode::Unimplemented(def) => Some(&def.type_class),
            TypeNode::Pointer(_)
            | TypeNode::Array(_)
            | TypeNode::CvQualified(_)
            | TypeNode::Callback(_) => None,
        }
    }

    /// The single type this node wraps, for the wrapper kinds.
    pub fn wrapped(&self) -> Option<TypeId> {
        match self {
            TypeNode::Pointer(def) => Some(def.pointee),
            TypeNode::Array(def) => Some(def.element),
            TypeNode::CvQualified(def) => Some(def.inner),
            TypeNode::Typedef(def) => Some(def.aliased),
            TypeNode::Field(def) => Some(def.ty),
            _ => None,
        }
    }
}

/// Owns every node of one parse and guarantees a 1:1 mapping between dump
/// element ids and node instances: two references to the same id resolve to
/// the same [`TypeId`].
#[derive(Debug, Default)]
pub struct TypeArena {
    nodes: Vec<TypeNode>,
    by_source: HashMap<String, TypeId>,
}

impl TypeArena {
    pub fn get(&self, id: TypeId) -> &TypeNode {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn get_mut(&mut self, id: TypeId) -> &mut TypeNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Node previously registered for a dump element id.
    pub fn lookup(&self, source_id: &str) -> Option<TypeId> {
        self.by_source.get(source_id).copied()
    }

    /// Add a node that has no dump id of its own (member-shaping `Field`
    /// wrappers).
    pub(crate) fn alloc(&mut self, node: TypeNode) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Register `node` as the one instance for `source_id`.
    pub(crate) fn register(&mut self, source_id: &str, node: TypeNode) -> TypeId {
        let id = self.alloc(node);
        self.by_source.insert(source_id.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Compact one-line rendering of a node, for CLI output and diagnostics.
    pub fn describe(&self, id: TypeId) -> String {
        match self.get(id) {
            TypeNode::Typedef(def) => {
                format!("typedef {} = {}", def.name, self.short(def.aliased))
            }
            TypeNode::Struct(def) => format!(
                "struct {} {{ {} }}",
                display_name(&def.name),
                self.member_list(def.members.resolved())
            ),
            TypeNode::Union(def) => format!(
                "union {} {{ {} }}",
                display_name(def.name.as_deref().unwrap_or("")),
                self.member_list(def.variants.resolved())
            ),
            TypeNode::Enum(def) => {
                let values: Vec<String> = def
                    .values
                    .iter()
                    .map(|value| format!("{} = {}", value.name, value.value))
                    .collect();
                format!(
                    "enum {} {{ {} }}",
                    display_name(def.name.as_deref().unwrap_or("")),
                    values.join(", ")
                )
            }
            TypeNode::Field(def) => format!(
                "field {}: {}",
                display_name(def.name.as_deref().unwrap_or("")),
                self.short(def.ty)
            ),
            TypeNode::Function(def) => format!(
                "fn {}{} -> {}",
                def.name,
                self.param_list(&def.params),
                self.short(def.returns)
            ),
            TypeNode::Unimplemented(def) => format!("unimplemented({})", def.type_class),
            _ => self.short(id),
        }
    }

    fn member_list(&self, members: &[TypeId]) -> String {
        members
            .iter()
            .map(|&member| match self.get(member) {
                TypeNode::Field(def) => format!(
                    "{}: {}",
                    def.name.as_deref().unwrap_or("_"),
                    self.short(def.ty)
                ),
                _ => self.short(member),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn param_list(&self, params: &[ParamDef]) -> String {
        let mut rendered = Vec::new();
        for param in params {
            let mut one = self.short(param.ty);
            if param.variadic {
                one.push_str(", ...");
            }
            rendered.push(one);
        }
        format!("({})", rendered.join(", "))
    }

    /// Shallow rendering: named kinds render as their name only, so cyclic
    /// graphs terminate.
    fn short(&self, id: TypeId) -> String {
        match self.get(id) {
            TypeNode::Fundamental(def) => def.name.clone(),
            TypeNode::Pointer(def) => format!("*{}", self.short(def.pointee)),
            TypeNode::Array(def) => format!(
                "{}[{}]",
                self.short(def.element),
                def.max.saturating_add(1).saturating_sub(def.min)
            ),
            TypeNode::CvQualified(def) => format!("const {}", self.short(def.inner)),
            TypeNode::Typedef(def) => def.name.clone(),
            TypeNode::Struct(def) => format!("struct {}", display_name(&def.name)),
            TypeNode::Union(def) => {
                format!("union {}", display_name(def.name.as_deref().unwrap_or("")))
            }
            TypeNode::Enum(def) => {
                format!("enum {}", display_name(def.name.as_deref().unwrap_or("")))
            }
            TypeNode::Field(def) => display_name(def.name.as_deref().unwrap_or("")).to_string(),
            TypeNode::Function(def) => def.name.clone(),
            TypeNode::Callback(def) => {
                let params: Vec<String> = def
                    .params
                    .iter()
                    .map(|param| self.short(param.ty))
                    .collect();
                format!("fn({}) -> {}", params.join(", "), self.short(def.returns))
            }
            TypeNode::Unimplemented(def) => def.type_class.clone(),
        }
    }
}

impl std::ops::Index<TypeId> for TypeArena {
    type Output = TypeNode;

    fn index(&self, id: TypeId) -> &TypeNode {
        self.get(id)
    }
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "<anonymous>" } else { name }
}

/// A fully resolved parse: every node of the dump plus the top-level
/// declarations in document order.
#[derive(Debug)]
pub struct Ast {
    pub types: TypeArena,
    pub roots: Vec<TypeId>,
}
