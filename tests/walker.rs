//! Document walking: ordering, bookkeeping skips, passthroughs and errors.

use castscrape::model::TypeNode;
use castscrape::{Ast, Document, Extractor, ParseError};

fn parse(xml: &str) -> Ast {
    castscrape::parse_xml_str(xml).expect("fixture should resolve")
}

#[test]
fn end_to_end_pointer_and_typedef() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <FundamentalType id="_1" name="int" size="4" align="4"/>
             <PointerType id="_2" type="_1" size="8" align="8"/>
             <Typedef id="_3" name="int_ptr" type="_2"/>
           </CastXML>"#,
    );

    assert_eq!(ast.roots.len(), 3);

    let pointer_id = ast.types.lookup("_2").unwrap();
    let TypeNode::Pointer(pointer) = &ast.types[pointer_id] else {
        panic!("expected pointer");
    };
    assert_eq!(pointer.size, 8);
    assert_eq!(pointer.align, 8);

    let TypeNode::Fundamental(pointee) = &ast.types[pointer.pointee] else {
        panic!("expected fundamental pointee");
    };
    assert_eq!(pointee.name, "int");
    assert_eq!(pointee.size, 4);
    assert_eq!(pointee.align, 4);

    let TypeNode::Typedef(typedef) = &ast.types[ast.types.lookup("_3").unwrap()] else {
        panic!("expected typedef");
    };
    assert_eq!(
        typedef.aliased, pointer_id,
        "the typedef must alias the very pointer instance yielded earlier"
    );
}

#[test]
fn bookkeeping_elements_are_skipped() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <Namespace id="_1" name="::"/>
             <File id="f0" name="lib.h"/>
             <FundamentalType id="_2" name="char" size="8" align="8"/>
             <File id="f1" name="other.h"/>
             <FundamentalType id="_3" name="int" size="32" align="32"/>
           </CastXML>"#,
    );

    assert_eq!(ast.roots.len(), 2, "namespaces and files carry no types");
    assert_eq!(ast.roots[0], ast.types.lookup("_2").unwrap());
    assert_eq!(ast.roots[1], ast.types.lookup("_3").unwrap());
}

#[test]
fn elaborated_type_resolves_to_referenced_node() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <Struct id="_1" name="point" size="64" align="32" members=""/>
             <ElaboratedType id="_2" type="_1"/>
             <Typedef id="_3" name="point_t" type="_2"/>
           </CastXML>"#,
    );

    let strukt = ast.types.lookup("_1").unwrap();
    let TypeNode::Typedef(typedef) = &ast.types[ast.types.lookup("_3").unwrap()] else {
        panic!("expected typedef");
    };
    assert_eq!(
        typedef.aliased, strukt,
        "the elaborated alias must resolve straight to the struct instance"
    );
    // The elaborated element appears as a root too and yields the same node.
    assert!(ast.roots.contains(&strukt));
}

#[test]
fn unknown_tag_is_fatal() {
    let result = castscrape::parse_xml_str(
        r#"<CastXML format="1.4.1">
             <Gibberish id="_1"/>
           </CastXML>"#,
    );

    match result {
        Err(ParseError::UnsupportedNode { tag }) => assert_eq!(tag, "Gibberish"),
        other => panic!("expected UnsupportedNode, got {other:?}"),
    }
}

#[test]
fn dangling_reference_is_fatal() {
    let result = castscrape::parse_xml_str(
        r#"<CastXML format="1.4.1">
             <Typedef id="_1" name="ghost" type="_99"/>
           </CastXML>"#,
    );

    match result {
        Err(ParseError::MissingReference { id }) => assert_eq!(id, "_99"),
        other => panic!("expected MissingReference, got {other:?}"),
    }
}

#[test]
fn non_castxml_root_is_rejected() {
    let result = castscrape::parse_xml_str(r#"<NotCastXML version="1"/>"#);

    match result {
        Err(ParseError::InvalidInput { root }) => assert_eq!(root, "NotCastXML"),
        other => panic!("expected InvalidInput, got {other:?}"),
    }
}

#[test]
fn walk_is_single_pass() {
    let document = Document::parse(
        r#"<CastXML format="1.4.1">
             <FundamentalType id="_1" name="int" size="32" align="32"/>
             <FundamentalType id="_2" name="char" size="8" align="8"/>
           </CastXML>"#,
    )
    .expect("fixture should load");

    let mut extractor = Extractor::new(&document);
    assert!(extractor.next().is_some());
    assert!(extractor.next().is_some());
    assert!(extractor.next().is_none());
    assert!(
        extractor.next().is_none(),
        "the walk does not restart once exhausted"
    );
}

#[test]
fn unimplemented_fallback_keeps_class_name() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <Unimplemented id="_1" type_class="Atomic"/>
           </CastXML>"#,
    );

    let TypeNode::Unimplemented(def) = &ast.types[ast.types.lookup("_1").unwrap()] else {
        panic!("expected unimplemented fallback");
    };
    assert_eq!(def.type_class, "Atomic");
}

#[test]
fn cv_qualified_and_array_wrap_their_types() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <FundamentalType id="_1" name="int" size="32" align="32"/>
             <CvQualifiedType id="_2" type="_1" const="1"/>
             <ArrayType id="_3" min="0" max="9" type="_1"/>
           </CastXML>"#,
    );

    let int_id = ast.types.lookup("_1").unwrap();
    let TypeNode::CvQualified(qualified) = &ast.types[ast.types.lookup("_2").unwrap()] else {
        panic!("expected cv-qualified");
    };
    assert_eq!(qualified.inner, int_id);

    let TypeNode::Array(array) = &ast.types[ast.types.lookup("_3").unwrap()] else {
        panic!("expected array");
    };
    assert_eq!(array.element, int_id);
    assert_eq!(array.min, 0);
    assert_eq!(array.max, 9);
}
