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

//! Integration tests for property metamodels and path navigation

use rstest::rstest;
use std::sync::Arc;
use std::thread;

use sqlweave::model::{Describe, HostObject, Value};
use sqlweave::reflection::{
    ClassDescriptor, MetaObject, NamedType, ReflectionError, Reflector, ReflectorFactory, Supertype,
    TypeDescriptor,
};

#[derive(Debug, Clone, Default)]
struct Author {
    id: i64,
    username: String,
    email: Option<String>,
    favourite: Value,
}

fn person_type() -> NamedType {
    NamedType::new("Person")
}

fn author_type() -> NamedType {
    NamedType::new("Author").extends(person_type())
}

fn person_layer() -> ClassDescriptor {
    ClassDescriptor::builder::<Author>("Identified")
        .type_params(["K"])
        .getter("getId", TypeDescriptor::var("K"), |a: &Author| a.id)
        .setter("setId", TypeDescriptor::var("K"), |a: &mut Author, v: i64| a.id = v)
        .getter("getFavourite", TypeDescriptor::named(person_type()), |a: &Author| {
            a.favourite.clone()
        })
        .build()
}

impl Describe for Author {
    fn describe() -> ClassDescriptor {
        ClassDescriptor::builder::<Author>("Author")
            .extends(Supertype::generic(person_layer(), vec![TypeDescriptor::Long]))
            .default_constructor()
            .getter("getUsername", TypeDescriptor::String, |a: &Author| a.username.clone())
            .setter("setUsername", TypeDescriptor::String, |a: &mut Author, v: String| {
                a.username = v
            })
            .getter("getFavourite", TypeDescriptor::named(author_type()), |a: &Author| {
                a.favourite.clone()
            })
            .field(
                "email",
                TypeDescriptor::String,
                |a: &Author| a.email.clone(),
                |a: &mut Author, v: Option<String>| a.email = v,
            )
            .static_final_field("TABLE", TypeDescriptor::String, |_: &Author| "author")
            .build()
    }
}

#[test]
fn building_twice_is_idempotent() {
    let first = Reflector::for_type::<Author>();
    let second = Reflector::for_type::<Author>();

    assert_eq!(first.readable_property_names(), second.readable_property_names());
    assert_eq!(first.writable_property_names(), second.writable_property_names());
    for name in first.readable_property_names() {
        assert_eq!(first.getter_type(name).unwrap(), second.getter_type(name).unwrap());
    }
    assert_eq!(
        first.readable_property_names(),
        ["TABLE", "email", "favourite", "id", "username"]
    );
    assert_eq!(first.writable_property_names(), ["email", "id", "username"]);
}

#[test]
fn inherited_generic_and_covariant_accessors() {
    let reflector = Reflector::for_type::<Author>();
    assert_eq!(reflector.getter_type("id").unwrap(), &TypeDescriptor::Long);
    assert_eq!(reflector.setter_type("id").unwrap(), &TypeDescriptor::Long);
    assert_eq!(
        reflector.getter_type("favourite").unwrap(),
        &TypeDescriptor::named(author_type())
    );
}

#[rstest]
#[case(TypeDescriptor::String, TypeDescriptor::Long)]
#[case(TypeDescriptor::named(NamedType::new("Blog")), TypeDescriptor::named(NamedType::new("Post")))]
fn unrelated_getter_types_fail_on_read(#[case] first: TypeDescriptor, #[case] second: TypeDescriptor) {
    let descriptor = ClassDescriptor::builder::<Author>("Author")
        .getter("getTitle", first, |_: &Author| Value::Null)
        .getter("getTitle", second, |_: &Author| Value::Null)
        .build();
    let reflector = Reflector::new(sqlweave::reflection::TypeKey::of::<Author>(), &descriptor);
    let object = HostObject::new(Author::default());

    assert!(matches!(
        reflector.read(&object, "title"),
        Err(ReflectionError::AmbiguousAccessor { .. })
    ));
}

#[test]
fn host_objects_are_shared_handles() {
    let factory = Arc::new(ReflectorFactory::new());
    let reflector = factory.find_for_type::<Author>();
    let object = reflector.instantiate().unwrap();

    let mut meta = MetaObject::for_object(Value::Object(object.clone()), Arc::clone(&factory));
    meta.set_value("username", Value::from("ada")).unwrap();
    meta.set_value("email", Value::from("ada@example.com")).unwrap();
    meta.set_value("id", Value::from(7)).unwrap();

    let author = object.downcast::<Author>().unwrap();
    assert_eq!(author.username, "ada");
    assert_eq!(author.email.as_deref(), Some("ada@example.com"));
    assert_eq!(author.id, 7);
    assert_eq!(meta.get_value("TABLE").unwrap(), Value::from("author"));

    let err = meta.set_value("id", Value::from("seven")).unwrap_err();
    assert!(matches!(err, ReflectionError::ValueMismatch { .. }));
}

#[test]
fn to_json_renders_readable_properties() {
    let factory = ReflectorFactory::new();
    let value = Value::object(Author {
        id: 1,
        username: "ada".to_string(),
        email: None,
        favourite: Value::Null,
    });
    let json = value.to_json(&factory).unwrap();
    assert_eq!(json["username"], "ada");
    assert_eq!(json["id"], 1);
    assert!(json["email"].is_null());
}

#[test]
fn concurrent_lookups_share_the_first_build() {
    let factory = Arc::new(ReflectorFactory::new());
    let reflectors: Vec<_> = (0..16)
        .map(|_| {
            let factory = Arc::clone(&factory);
            thread::spawn(move || factory.find_for_type::<Author>())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert!(reflectors.iter().all(|r| Arc::ptr_eq(r, &reflectors[0])));
    assert_eq!(factory.stats().builds, 1);
}
