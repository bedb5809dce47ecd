//! End-to-end tests: query string in, compiled request out.

use insta::assert_snapshot;
use queryfly::{
    bind, parse, parse_query_string, Builder, Dir, Op, QueryError, QueryParams, Value,
};

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn parse_basic_comparison() {
    let query = parse_query_string("age=gte:18");
    assert_eq!(query.filters.len(), 1);
    assert_eq!(query.filters[0].field, "age");
    assert_eq!(query.filters[0].op.symbol(), ">=");
    assert_eq!(query.filters[0].value, Value::from("18"));
}

#[test]
fn parse_in_list() {
    let query = parse_query_string("age=in:1,2,3");
    assert_eq!(query.filters[0].op, Op::In);
    assert_eq!(query.filters[0].value, Value::from(vec!["1", "2", "3"]));
}

#[test]
fn parse_order_by() {
    let query = parse_query_string("_orderBy=name:1,age:-1");
    let orders: Vec<(String, Dir)> = query
        .orders
        .iter()
        .map(|o| (o.field.clone(), o.direction.dir()))
        .collect();
    assert_eq!(
        orders,
        vec![("name".to_string(), Dir::Asc), ("age".to_string(), Dir::Desc)]
    );
}

#[test]
fn parse_projection() {
    let query = parse_query_string("_field=a,b,c");
    assert_eq!(query.select(), vec!["a", "b", "c"]);

    let query = parse_query_string("age=eq:1");
    assert_eq!(query.projection, None);
    assert_eq!(query.select(), vec!["*"]);
}

#[test]
fn in_list_with_commas_survives_compile_and_parse() {
    let mut builder = Builder::new("places");
    builder.where_in("city", ["a,b", "c"]);
    let request = builder.compile().unwrap();
    assert_snapshot!(request.query, @"city=in:a%2Cb,c");

    let query = parse_query_string(&request.query);
    assert_eq!(query.filters[0].value, Value::from(vec!["a,b", "c"]));
}

#[test]
fn parse_from_pairs_with_list_values() {
    let mut params = QueryParams::new();
    params.insert("age", vec!["gte:18", "lt:65"]);
    params.insert("_limit", "10");
    let query = parse(&params);
    assert_eq!(query.filters.len(), 2);
    assert_eq!(query.get_limit(), Some(10));
}

// ============================================================================
// Compiling
// ============================================================================

#[test]
fn compile_filters_then_limit() {
    let mut builder = Builder::new("users");
    builder.where_("age", ">=", "18").limit(10);
    let request = builder.compile().unwrap();
    assert_snapshot!(request.url(), @"/users/query?age=gte:18&_limit=10");
}

#[test]
fn compile_unset_and_wildcard_projection_alike() {
    let mut unset = Builder::new("users");
    unset.where_("a", "=", 1);
    let mut wildcard = unset.clone();
    wildcard.select(["*"]);
    assert_eq!(unset.compile().unwrap(), wildcard.compile().unwrap());
}

#[test]
fn compile_every_where_kind() {
    let mut builder = Builder::new("posts");
    builder
        .select(["title", "author"])
        .where_("posts.views", ">", 100)
        .or_where("title", "like", "rust%")
        .where_in("tag", ["a b", "c"])
        .where_not_in("status", ["draft"])
        .where_null("deleted_at")
        .or_where_not_null("published_at")
        .where_between("score", 1, 5)
        .where_not_between("rank", 10, 20)
        .order_desc("views")
        .order_by("natural", "asc")
        .for_page(2, 25);
    let request = builder.compile().unwrap();
    assert_snapshot!(request.query, @"field=title,author&views=gt:100&!title=like:rust%25&tag=in:a%20b,c&status=nin:draft&deleted_at=null&!published_at=!null&score=between:1,5&rank=!between:10,20&_orderBy=views:-1,$natural:1&_limit=25&_offset=25");
}

#[test]
fn compile_nested_is_not_supported() {
    let mut builder = Builder::new("users");
    builder
        .where_("a", "=", 1)
        .or_where_nested(|q| {
            q.where_("b", "=", 2).where_("c", "=", 3);
        })
        .limit(1);
    match builder.compile() {
        Err(QueryError::NotSupported(message)) => assert!(message.contains("nested")),
        other => panic!("expected NotSupported, got {other:?}"),
    }
}

// ============================================================================
// Parse, bind, compile
// ============================================================================

#[test]
fn incoming_query_drives_outgoing_request() {
    let query = parse_query_string(
        "age=gte:18&age=lt:65&!name=like:J%25&city=in:Oslo,Bergen&score=between:1,9&_orderBy=age:desc&_limit=20&_offset=40&_field=name,age",
    );
    let mut builder = Builder::new("people");
    let bound = bind(&query, &mut builder, None).unwrap();
    assert_eq!(bound.projection, vec!["name", "age"]);

    let request = builder.compile().unwrap();
    assert_snapshot!(request.url(), @"/people/query?age=gte:18&age=lt:65&name=like:J%25&city=in:Oslo,Bergen&score=between:1,9&_orderBy=age:-1&_limit=20&_offset=40");
}

#[test]
fn not_in_compiles_to_nin() {
    let query = parse_query_string("id=!in:1,2");
    let mut builder = Builder::new("items");
    bind(&query, &mut builder, None).unwrap();
    assert_eq!(builder.compile().unwrap().query, "id=nin:1,2");
}

#[test]
fn cache_key_follows_logical_content() {
    let build = |limit| {
        let query = parse_query_string("age=gte:18&_orderBy=name:1");
        let mut builder = Builder::new("users");
        bind(&query, &mut builder, None).unwrap();
        builder.limit(limit);
        builder
    };
    assert_eq!(
        build(10).generate_cache_key().unwrap(),
        build(10).generate_cache_key().unwrap()
    );
    assert_ne!(
        build(10).generate_cache_key().unwrap(),
        build(11).generate_cache_key().unwrap()
    );
}
