// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Integration tests for evaluation contexts and fragment trees

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::sync::Arc;

use sqlweave::config::{Configuration, EngineConfig};
use sqlweave::expression::{ExpressionEvaluator, ExpressionResult, VariableScope};
use sqlweave::model::{Describe, Value};
use sqlweave::reflection::{ClassDescriptor, TypeDescriptor};
use sqlweave::scripting::{
    DATABASE_ID_KEY, DynamicContext, MixedSqlNode, PARAMETER_OBJECT_KEY, SqlNode, SqlTemplate,
    StaticTextSqlNode, VarDeclSqlNode,
};

#[derive(Debug, Clone, Default)]
struct Query {
    title: String,
    limit: i64,
}

impl Describe for Query {
    fn describe() -> ClassDescriptor {
        ClassDescriptor::builder::<Query>("Query")
            .getter("getTitle", TypeDescriptor::String, |q: &Query| q.title.clone())
            .getter("getLimit", TypeDescriptor::Long, |q: &Query| q.limit)
            .build()
    }
}

#[test]
fn static_text_joins_with_single_space() {
    let configuration = Configuration::default();
    let mut context = DynamicContext::new(&configuration, Value::Null);
    let root = MixedSqlNode::new(vec![
        Box::new(StaticTextSqlNode::new("SELECT")),
        Box::new(StaticTextSqlNode::new("* FROM t")),
    ]);

    assert!(root.apply(&mut context).unwrap());
    assert_eq!(context.sql(), "SELECT * FROM t");
}

#[test]
fn later_binds_see_earlier_ones() {
    let configuration = Configuration::default();
    let mut context = DynamicContext::new(&configuration, Value::Null);
    let root = MixedSqlNode::new(vec![
        Box::new(VarDeclSqlNode::new("x", "1+1")),
        Box::new(VarDeclSqlNode::new("y", "x+1")),
    ]);

    root.apply(&mut context).unwrap();
    assert_eq!(context.lookup("y").unwrap(), Value::Integer(3));
}

#[test]
fn unique_numbers_restart_per_context() {
    let configuration = Configuration::default();
    for _ in 0..2 {
        let mut context = DynamicContext::new(&configuration, Value::Null);
        let numbers: Vec<usize> = (0..3).map(|_| context.unique_number()).collect();
        assert_eq!(numbers, [0, 1, 2]);
    }
}

#[rstest]
#[case("id", Value::Integer(10))]
#[case("name", Value::from("ann"))]
#[case("absent", Value::Null)]
fn mapping_parameter_lookup(#[case] name: &str, #[case] expected: Value) {
    let configuration = Configuration::default();
    let context = DynamicContext::new(
        &configuration,
        Value::map([("id", Value::from(10)), ("name", Value::from("ann"))]),
    );
    assert_eq!(context.lookup(name).unwrap(), expected);
}

#[test]
fn object_without_property_or_coder_is_returned_whole() {
    let configuration = Configuration::default();
    let query = Value::object(Query {
        title: "rust".to_string(),
        limit: 5,
    });
    let context = DynamicContext::new(&configuration, query.clone());

    assert_eq!(context.lookup("foo").unwrap(), query);
    assert_eq!(context.lookup("limit").unwrap(), Value::Integer(5));
    assert_eq!(context.lookup(PARAMETER_OBJECT_KEY).unwrap(), query);
}

#[test]
fn template_renders_against_host_object() {
    let configuration = Configuration::new(EngineConfig::default().with_database_id("postgres"));
    let template = SqlTemplate::from_json_str(
        r#"[
            {"type": "bind", "name": "pattern", "value": "'%' + title + '%'"},
            {"type": "bind", "name": "page", "value": "limit * 2"},
            {"type": "text", "text": "SELECT * FROM post"},
            {"type": "text", "text": "WHERE title LIKE #{pattern} LIMIT #{page}"}
        ]"#,
    )
    .unwrap();

    let bound = template
        .render(
            &configuration,
            Value::object(Query {
                title: "rust".to_string(),
                limit: 5,
            }),
        )
        .unwrap();

    assert_eq!(bound.sql, "SELECT * FROM post WHERE title LIKE #{pattern} LIMIT #{page}");
    assert_eq!(bound.bindings["pattern"], Value::from("%rust%"));
    assert_eq!(bound.bindings["page"], Value::Integer(10));
    assert_eq!(bound.bindings[DATABASE_ID_KEY], Value::from("postgres"));

    let json = bound.to_json(configuration.reflectors()).unwrap();
    assert_eq!(json["bindings"]["_parameter"]["title"], "rust");
}

#[test]
fn custom_evaluator_replaces_the_reference_one() {
    #[derive(Debug)]
    struct Echo;

    impl ExpressionEvaluator for Echo {
        fn evaluate(&self, expression: &str, scope: &mut dyn VariableScope) -> ExpressionResult<Value> {
            scope.assign("seen", Value::from(expression));
            Ok(Value::from(expression.len()))
        }
    }

    let configuration = Configuration::default().with_evaluator(Arc::new(Echo));
    let mut context = DynamicContext::new(&configuration, Value::Null);
    VarDeclSqlNode::new("n", "anything").apply(&mut context).unwrap();

    assert_eq!(context.lookup("n").unwrap(), Value::Integer(8));
    assert_eq!(context.lookup("seen").unwrap(), Value::from("anything"));
}
