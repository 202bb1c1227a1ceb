//! Extraction — castxml dump elements → type AST nodes.
//!
//! The dump is a flat graph, not a tree: every element carries an `id` and
//! refers to other elements by id attributes, and a struct's field may point
//! back (directly or through typedefs and pointers) at the struct itself.
//! [`Extractor`] walks that graph and resolves it into [`TypeNode`]s,
//! guaranteeing one node instance per id no matter how many paths reach it,
//! and terminating on self- and mutually-referential aggregates.

use tracing::{debug, trace};

use crate::error::ParseError;
use crate::model::{
    ArrayDef, Ast, CallbackDef, CvQualifiedDef, EnumDef, EnumValue, FieldDef, FunctionDef,
    FunctionFlags, FundamentalDef, Members, ParamDef, PointerDef, StructDef, TypeArena, TypeId,
    TypeNode, TypedefDef, UnimplementedDef, UnionDef,
};
use crate::xml::{Element, ElementGraph, ElementId};

/// Root-level bookkeeping elements that carry no type information.
const IGNORED_NODES: &[&str] = &["Namespace", "File"];

/// Walk the whole document and collect its top-level declarations.
pub fn extract<G: ElementGraph>(graph: &G) -> Result<Ast, ParseError> {
    let mut extractor = Extractor::new(graph);
    let mut roots = Vec::new();
    for declaration in extractor.by_ref() {
        roots.push(declaration?);
    }
    let types = extractor.into_types();
    debug!(
        declarations = roots.len(),
        nodes = types.len(),
        "extraction complete"
    );
    Ok(Ast { types, roots })
}

/// Resolves dump elements into AST nodes, one instance per dump id.
///
/// Also the document walker: iterating the extractor yields the dump's
/// top-level declarations in document order, skipping bookkeeping elements.
/// The walk is single-pass; each root element is visited once.
pub struct Extractor<'g, G: ElementGraph> {
    graph: &'g G,
    types: TypeArena,
    cursor: usize,
}

impl<'g, G: ElementGraph> Extractor<'g, G> {
    pub fn new(graph: &'g G) -> Self {
        Self {
            graph,
            types: TypeArena::default(),
            cursor: 0,
        }
    }

    /// Nodes resolved so far.
    pub fn types(&self) -> &TypeArena {
        &self.types
    }

    /// Consume the extractor, keeping the resolved nodes.
    pub fn into_types(self) -> TypeArena {
        self.types
    }

    /// The one node for the element with the given `id` attribute, building
    /// it on first reference.
    pub fn resolve_id(&mut self, source_id: &str) -> Result<TypeId, ParseError> {
        match self.graph.find_by_id(source_id) {
            Some(element) => self.find_or_create(element),
            None => Err(ParseError::MissingReference {
                id: source_id.to_string(),
            }),
        }
    }

    /// Materialize a struct/union member list, dereferencing the captured
    /// member ids through the registry. Idempotent: once materialized,
    /// repeated calls return the same list without touching the dump again.
    ///
    /// The swap to an empty resolved list happens before the first member id
    /// is dereferenced. A re-entrant call for an aggregate that is
    /// mid-resolution (mutually-referential structs) therefore observes the
    /// resolved state and returns the list as it stands at that instant,
    /// which may be partially filled. Non-aggregate nodes resolve to an
    /// empty list.
    pub fn resolve_members(&mut self, id: TypeId) -> Result<&[TypeId], ParseError> {
        let pending = match self.types.get_mut(id) {
            TypeNode::Struct(def) => def.members.take_pending(),
            TypeNode::Union(def) => def.variants.take_pending(),
            _ => None,
        };

        if let Some(member_ids) = pending {
            for member_id in &member_ids {
                let member = self.resolve_id(member_id)?;
                if let Some(member) = self.shape_member(member) {
                    match self.types.get_mut(id) {
                        TypeNode::Struct(def) => def.members.push(member),
                        TypeNode::Union(def) => def.variants.push(member),
                        _ => {}
                    }
                }
            }
            debug!(
                name = self.types.get(id).name().unwrap_or(""),
                captured = member_ids.len(),
                "materialized aggregate members"
            );
        }

        Ok(match self.types.get(id) {
            TypeNode::Struct(def) => def.members.resolved(),
            TypeNode::Union(def) => def.variants.resolved(),
            _ => &[],
        })
    }

    fn find_or_create(&mut self, element_id: ElementId) -> Result<TypeId, ParseError> {
        let graph = self.graph;
        let element = graph.element(element_id);
        let source_id = element.attr("id").unwrap_or("");

        if let Some(id) = self.types.lookup(source_id) {
            // Lookups resolve aggregates too, cache hits included; a hit on
            // a node that is mid-resolution terminates in resolve_members'
            // already-resolved guard.
            self.resolve_members(id)?;
            return Ok(id);
        }

        // Relation passthrough: an elaborated alias resolves to the node it
        // references, with no node or id entry of its own.
        if element.tag() == "ElaboratedType" {
            return self.resolve_id(element.attr("type").unwrap_or(""));
        }

        let node = self.build(element)?;
        let id = self.types.register(source_id, node);
        trace!(
            id = source_id,
            kind = self.types.get(id).kind(),
            "registered node"
        );
        self.resolve_members(id)?;
        Ok(id)
    }

    /// Build the node for one element. Reference attributes other than
    /// aggregate member lists resolve eagerly here.
    fn build(&mut self, element: &Element) -> Result<TypeNode, ParseError> {
        match element.tag() {
            "Typedef" => Ok(TypeNode::Typedef(TypedefDef {
                name: attr_string(element, "name"),
                aliased: self.resolve_type_ref(element)?,
            })),
            "FundamentalType" => Ok(TypeNode::Fundamental(FundamentalDef {
                name: attr_string(element, "name"),
                size: attr_usize(element, "size"),
                align: attr_usize(element, "align"),
            })),
            "Struct" => Ok(TypeNode::Struct(StructDef {
                name: attr_string(element, "name"),
                size: attr_usize(element, "size"),
                align: attr_usize(element, "align"),
                members: Members::Pending(member_ids(element)),
            })),
            "PointerType" => Ok(TypeNode::Pointer(PointerDef {
                pointee: self.resolve_type_ref(element)?,
                size: attr_usize(element, "size"),
                align: attr_usize(element, "align"),
            })),
            "ArrayType" => Ok(TypeNode::Array(ArrayDef {
                element: self.resolve_type_ref(element)?,
                min: attr_usize(element, "min"),
                max: attr_usize(element, "max"),
            })),
            "Enumeration" => Ok(TypeNode::Enum(self.build_enum(element))),
            "FunctionType" => Ok(TypeNode::Callback(CallbackDef {
                returns: self.resolve_id(element.attr("returns").unwrap_or(""))?,
                params: self.build_params(element)?,
            })),
            "Function" => Ok(TypeNode::Function(FunctionDef {
                name: attr_string(element, "name"),
                returns: self.resolve_id(element.attr("returns").unwrap_or(""))?,
                params: self.build_params(element)?,
                flags: FunctionFlags {
                    inline: attr_flag(element, "inline"),
                    is_static: attr_flag(element, "static"),
                    artificial: attr_flag(element, "artificial"),
                    is_extern: attr_flag(element, "extern"),
                },
            })),
            "Unimplemented" => Ok(TypeNode::Unimplemented(UnimplementedDef {
                type_class: attr_string(element, "type_class"),
            })),
            "Union" => Ok(TypeNode::Union(UnionDef {
                name: attr_opt_string(element, "name"),
                size: attr_usize(element, "size"),
                align: attr_usize(element, "align"),
                variants: Members::Pending(member_ids(element)),
            })),
            "CvQualifiedType" => Ok(TypeNode::CvQualified(CvQualifiedDef {
                inner: self.resolve_type_ref(element)?,
            })),
            "Field" => Ok(TypeNode::Field(FieldDef {
                name: attr_opt_string(element, "name"),
                ty: self.resolve_type_ref(element)?,
            })),
            other => Err(ParseError::UnsupportedNode {
                tag: other.to_string(),
            }),
        }
    }

    fn resolve_type_ref(&mut self, element: &Element) -> Result<TypeId, ParseError> {
        self.resolve_id(element.attr("type").unwrap_or(""))
    }

    fn build_enum(&self, element: &Element) -> EnumDef {
        let mut values: Vec<EnumValue> = Vec::new();
        for &child in element.children() {
            let child = self.graph.element(child);
            if child.tag() != "EnumValue" {
                continue;
            }
            let name = attr_string(child, "name");
            let value = attr_i64(child, "init");
            // A duplicated enumerator name keeps its original position; the
            // later value wins.
            match values.iter_mut().find(|existing| existing.name == name) {
                Some(existing) => existing.value = value,
                None => values.push(EnumValue { name, value }),
            }
        }
        EnumDef {
            name: attr_opt_string(element, "name"),
            size: attr_usize(element, "size"),
            align: attr_usize(element, "align"),
            values,
        }
    }

    /// Argument children in declaration order. An `Ellipsis` child marks the
    /// preceding argument variadic and cannot come first.
    fn build_params(&mut self, element: &Element) -> Result<Vec<ParamDef>, ParseError> {
        let graph = self.graph;
        let mut params = Vec::new();
        for &child in element.children() {
            let child = graph.element(child);
            match child.tag() {
                "Argument" => params.push(ParamDef {
                    name: attr_opt_string(child, "name"),
                    ty: self.resolve_type_ref(child)?,
                    variadic: false,
                }),
                "Ellipsis" => match params.last_mut() {
                    Some(last) => last.variadic = true,
                    None => return Err(ParseError::MalformedSignature),
                },
                other => {
                    return Err(ParseError::UnsupportedNode {
                        tag: other.to_string(),
                    });
                }
            }
        }
        Ok(params)
    }

    /// Member shaping: `Field`s pass through; named kinds become a fresh
    /// `Field` wrapping them, or vanish when anonymous; nameless kinds pass
    /// through unchanged.
    fn shape_member(&mut self, member: TypeId) -> Option<TypeId> {
        match self.types.get(member) {
            TypeNode::Field(_) => Some(member),
            node => match node.name() {
                Some("") => None,
                Some(name) => {
                    let name = name.to_string();
                    Some(self.types.alloc(TypeNode::Field(FieldDef {
                        name: Some(name),
                        ty: member,
                    })))
                }
                None => Some(member),
            },
        }
    }
}

impl<G: ElementGraph> Iterator for Extractor<'_, G> {
    type Item = Result<TypeId, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.graph;
        loop {
            let element = *graph.roots().get(self.cursor)?;
            self.cursor += 1;
            let tag = graph.element(element).tag();
            if IGNORED_NODES.contains(&tag) {
                continue;
            }
            return Some(self.find_or_create(element));
        }
    }
}

fn attr_string(element: &Element, name: &str) -> String {
    element.attr(name).unwrap_or_default().to_string()
}

fn attr_opt_string(element: &Element, name: &str) -> Option<String> {
    element
        .attr(name)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Numeric attributes coerce leniently: absent or non-numeric values read
/// as zero, matching what the dumper's consumers have always tolerated.
fn attr_usize(element: &Element, name: &str) -> usize {
    element
        .attr(name)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

fn attr_i64(element: &Element, name: &str) -> i64 {
    element
        .attr(name)
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

/// Boolean attributes are emitted as `"1"` when set.
fn attr_flag(element: &Element, name: &str) -> bool {
    matches!(element.attr(name), Some(value) if !value.is_empty() && value != "0")
}

/// Member lists arrive as one space-separated id attribute. They are
/// captured verbatim and dereferenced later (see
/// [`Extractor::resolve_members`]) so an aggregate never blocks on
/// resolving its own members.
fn member_ids(element: &Element) -> Vec<String> {
    element
        .attr("members")
        .unwrap_or("")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
