//! Function signatures, variadic marking, flags and enum values.

use castscrape::ParseError;
use castscrape::model::TypeNode;
use castscrape::Ast;

fn parse(xml: &str) -> Ast {
    castscrape::parse_xml_str(xml).expect("fixture should resolve")
}

#[test]
fn ellipsis_marks_last_argument_variadic() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <FundamentalType id="_1" name="int" size="32" align="32"/>
             <FundamentalType id="_2" name="char" size="8" align="8"/>
             <PointerType id="_3" type="_2" size="64" align="64"/>
             <Function id="_4" name="printf" returns="_1">
               <Argument name="x" type="_1"/>
               <Argument name="y" type="_3"/>
               <Ellipsis/>
             </Function>
           </CastXML>"#,
    );

    let TypeNode::Function(def) = &ast.types[ast.types.lookup("_4").unwrap()] else {
        panic!("expected function");
    };
    assert_eq!(def.name, "printf");
    assert_eq!(def.params.len(), 2);
    assert_eq!(def.params[0].name.as_deref(), Some("x"));
    assert!(!def.params[0].variadic);
    assert_eq!(def.params[1].name.as_deref(), Some("y"));
    assert!(def.params[1].variadic);
}

#[test]
fn leading_ellipsis_is_rejected() {
    let result = castscrape::parse_xml_str(
        r#"<CastXML format="1.4.1">
             <FundamentalType id="_1" name="void" size="0" align="0"/>
             <Function id="_2" name="broken" returns="_1">
               <Ellipsis/>
             </Function>
           </CastXML>"#,
    );

    match result {
        Err(ParseError::MalformedSignature) => {}
        other => panic!("expected MalformedSignature, got {other:?}"),
    }
}

#[test]
fn unnamed_argument_has_no_name() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <FundamentalType id="_1" name="int" size="32" align="32"/>
             <Function id="_2" name="abs" returns="_1">
               <Argument type="_1"/>
             </Function>
           </CastXML>"#,
    );

    let TypeNode::Function(def) = &ast.types[ast.types.lookup("_2").unwrap()] else {
        panic!("expected function");
    };
    assert_eq!(def.params.len(), 1);
    assert_eq!(def.params[0].name, None);
}

#[test]
fn function_flags_are_captured() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <FundamentalType id="_1" name="void" size="0" align="0"/>
             <Function id="_2" name="helper" returns="_1" inline="1" static="1"/>
             <Function id="_3" name="plain" returns="_1"/>
           </CastXML>"#,
    );

    let TypeNode::Function(helper) = &ast.types[ast.types.lookup("_2").unwrap()] else {
        panic!("expected function");
    };
    assert!(helper.flags.inline);
    assert!(helper.flags.is_static);
    assert!(!helper.flags.artificial);
    assert!(!helper.flags.is_extern);

    let TypeNode::Function(plain) = &ast.types[ast.types.lookup("_3").unwrap()] else {
        panic!("expected function");
    };
    assert_eq!(plain.flags, Default::default());
}

#[test]
fn callback_type_carries_signature() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <FundamentalType id="_1" name="int" size="32" align="32"/>
             <FundamentalType id="_2" name="void" size="0" align="0"/>
             <FunctionType id="_3" returns="_2">
               <Argument type="_1"/>
               <Argument type="_1"/>
             </FunctionType>
           </CastXML>"#,
    );

    let TypeNode::Callback(def) = &ast.types[ast.types.lookup("_3").unwrap()] else {
        panic!("expected callback");
    };
    assert_eq!(def.returns, ast.types.lookup("_2").unwrap());
    assert_eq!(def.params.len(), 2);
    assert_eq!(def.params[0].ty, ast.types.lookup("_1").unwrap());
}

#[test]
fn enum_values_keep_declaration_order() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <Enumeration id="_1" name="level" size="32" align="32">
               <EnumValue name="A" init="0"/>
               <EnumValue name="B" init="5"/>
               <EnumValue name="C" init="6"/>
             </Enumeration>
           </CastXML>"#,
    );

    let TypeNode::Enum(def) = &ast.types[ast.types.lookup("_1").unwrap()] else {
        panic!("expected enum");
    };
    let pairs: Vec<(&str, i64)> = def
        .values
        .iter()
        .map(|value| (value.name.as_str(), value.value))
        .collect();
    assert_eq!(pairs, vec![("A", 0), ("B", 5), ("C", 6)]);
}

#[test]
fn duplicate_enumerator_keeps_position_last_value_wins() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <Enumeration id="_1" name="dup" size="32" align="32">
               <EnumValue name="A" init="1"/>
               <EnumValue name="B" init="2"/>
               <EnumValue name="A" init="9"/>
             </Enumeration>
           </CastXML>"#,
    );

    let TypeNode::Enum(def) = &ast.types[ast.types.lookup("_1").unwrap()] else {
        panic!("expected enum");
    };
    let pairs: Vec<(&str, i64)> = def
        .values
        .iter()
        .map(|value| (value.name.as_str(), value.value))
        .collect();
    assert_eq!(pairs, vec![("A", 9), ("B", 2)]);
}

#[test]
fn negative_enumerator_values_parse() {
    let ast = parse(
        r#"<CastXML format="1.4.1">
             <Enumeration id="_1" name="signed_levels" size="32" align="32">
               <EnumValue name="BELOW" init="-1"/>
               <EnumValue name="ZERO" init="0"/>
             </Enumeration>
           </CastXML>"#,
    );

    let TypeNode::Enum(def) = &ast.types[ast.types.lookup("_1").unwrap()] else {
        panic!("expected enum");
    };
    assert_eq!(def.values[0].value, -1);
}
