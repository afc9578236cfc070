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

//! Per-type property metamodel
//!
//! A [`Reflector`] is built once from a [`ClassDescriptor`] and then only read.
//! Building never fails: missing constructors, missing properties and
//! conflicting accessors are reported when they are first used.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use std::any::Any;

use super::descriptor::{ClassDescriptor, ConstructFn, FieldDecl, MethodDecl, Supertype};
use super::error::{ReflectionError, ReflectionResult};
use super::invoker::{AmbiguousInvoker, FieldInvoker, Invoker, MethodInvoker};
use super::property_namer::{is_getter, is_setter, is_valid_property_name, method_to_property};
use super::types::{TypeDescriptor, TypeKey};
use crate::model::{Describe, HostObject, Value};

type TypeEnv = FxHashMap<String, TypeDescriptor>;

/// A method found during discovery, with the generic environment of its declaring layer
#[derive(Clone)]
struct Discovered<'a> {
    decl: &'a MethodDecl,
    declaring_class: &'a str,
    env: TypeEnv,
}

impl Discovered<'_> {
    fn resolve(&self, ty: &TypeDescriptor) -> TypeDescriptor {
        ty.bind(&self.env).erased()
    }

    fn return_type(&self) -> TypeDescriptor {
        self.resolve(&self.decl.returns)
    }

    fn param_type(&self) -> TypeDescriptor {
        self.resolve(&self.decl.params[0])
    }

    fn identity(&self) -> String {
        let params: Vec<String> = self.decl.params.iter().map(ToString::to_string).collect();
        format!(
            "{}.{}({}): {}",
            self.declaring_class,
            self.decl.name,
            params.join(", "),
            self.decl.returns
        )
    }
}

/// Cached table of a host type's readable and writable properties
pub struct Reflector {
    type_key: TypeKey,
    class_name: String,
    readable_property_names: Vec<String>,
    writable_property_names: Vec<String>,
    set_methods: FxHashMap<String, Invoker>,
    get_methods: FxHashMap<String, Invoker>,
    set_types: FxHashMap<String, TypeDescriptor>,
    get_types: FxHashMap<String, TypeDescriptor>,
    default_constructor: Option<ConstructFn>,
    case_insensitive_property_map: FxHashMap<String, String>,
}

impl Reflector {
    /// Build the metamodel of a [`Describe`] type
    pub fn for_type<T: Describe>() -> Self {
        Self::new(TypeKey::of::<T>(), &T::describe())
    }

    /// Build the metamodel for the type identified by `type_key`
    pub fn new(type_key: TypeKey, descriptor: &ClassDescriptor) -> Self {
        let mut reflector = Self {
            type_key,
            class_name: descriptor.name().to_string(),
            readable_property_names: Vec::new(),
            writable_property_names: Vec::new(),
            set_methods: FxHashMap::default(),
            get_methods: FxHashMap::default(),
            set_types: FxHashMap::default(),
            get_types: FxHashMap::default(),
            default_constructor: None,
            case_insensitive_property_map: FxHashMap::default(),
        };

        reflector.add_default_constructor(descriptor);
        let methods = class_methods(descriptor);
        if descriptor.record {
            reflector.add_record_get_methods(&methods);
        } else {
            reflector.add_get_methods(&methods);
            reflector.add_set_methods(&methods);
            reflector.add_fields(descriptor, &TypeEnv::default(), &mut FxHashSet::default());
        }

        reflector.readable_property_names = reflector.get_methods.keys().cloned().collect();
        reflector.readable_property_names.sort();
        reflector.writable_property_names = reflector.set_methods.keys().cloned().collect();
        reflector.writable_property_names.sort();

        for name in reflector
            .readable_property_names
            .iter()
            .chain(reflector.writable_property_names.iter())
        {
            reflector
                .case_insensitive_property_map
                .insert(name.to_uppercase(), name.clone());
        }

        log::debug!(
            "Built reflector for {} ({} readable, {} writable)",
            reflector.class_name,
            reflector.readable_property_names.len(),
            reflector.writable_property_names.len()
        );
        reflector
    }

    fn add_default_constructor(&mut self, descriptor: &ClassDescriptor) {
        self.default_constructor = descriptor
            .constructors
            .iter()
            .filter(|c| c.params.is_empty())
            .find_map(|c| c.body.clone());
    }

    fn add_record_get_methods(&mut self, methods: &[Discovered<'_>]) {
        for method in methods.iter().filter(|m| m.decl.params.is_empty()) {
            self.add_get_method(&method.decl.name, method, None);
        }
    }

    fn add_get_methods(&mut self, methods: &[Discovered<'_>]) {
        let mut conflicting_getters: IndexMap<String, Vec<&Discovered<'_>>> = IndexMap::new();
        for method in methods
            .iter()
            .filter(|m| m.decl.params.is_empty() && is_getter(&m.decl.name))
        {
            add_method_conflict(&mut conflicting_getters, method);
        }
        self.resolve_getter_conflicts(conflicting_getters);
    }

    fn resolve_getter_conflicts(&mut self, conflicting_getters: IndexMap<String, Vec<&Discovered<'_>>>) {
        for (property, candidates) in conflicting_getters {
            let mut winner: Option<&Discovered<'_>> = None;
            let mut rival: Option<&Discovered<'_>> = None;
            for candidate in candidates {
                let Some(current) = winner else {
                    winner = Some(candidate);
                    continue;
                };
                let winner_type = current.decl.returns.erased();
                let candidate_type = candidate.decl.returns.erased();
                if candidate_type == winner_type {
                    if candidate_type != TypeDescriptor::Boolean {
                        rival = Some(candidate);
                        break;
                    }
                    if candidate.decl.name.starts_with("is") {
                        winner = Some(candidate);
                    }
                } else if candidate_type.is_assignable_from(&winner_type) {
                    // winner is the more specific type
                } else if winner_type.is_assignable_from(&candidate_type) {
                    winner = Some(candidate);
                } else {
                    rival = Some(candidate);
                    break;
                }
            }
            if let Some(winner) = winner {
                self.add_get_method(&property, winner, rival);
            }
        }
    }

    fn add_get_method(&mut self, name: &str, method: &Discovered<'_>, rival: Option<&Discovered<'_>>) {
        let value_type = method.return_type();
        let invoker = match rival {
            Some(rival) => {
                let message = format!(
                    "Illegal overloaded getter method with ambiguous type for property '{}' in class '{}'. \
                     Accessors with one name must agree on a type or reads become unpredictable.",
                    name, method.declaring_class
                );
                log::warn!("{message}");
                Invoker::Ambiguous(AmbiguousInvoker::new(
                    name,
                    method.declaring_class,
                    vec![method.identity(), rival.identity()],
                    message,
                    value_type.clone(),
                ))
            }
            None => Invoker::Method(MethodInvoker::new(
                name,
                value_type.clone(),
                method.decl.body.clone(),
            )),
        };
        self.get_methods.insert(name.to_string(), invoker);
        self.get_types.insert(name.to_string(), value_type);
    }

    fn add_set_methods(&mut self, methods: &[Discovered<'_>]) {
        let mut conflicting_setters: IndexMap<String, Vec<&Discovered<'_>>> = IndexMap::new();
        for method in methods
            .iter()
            .filter(|m| m.decl.params.len() == 1 && is_setter(&m.decl.name))
        {
            add_method_conflict(&mut conflicting_setters, method);
        }
        self.resolve_setter_conflicts(conflicting_setters);
    }

    fn resolve_setter_conflicts(&mut self, conflicting_setters: IndexMap<String, Vec<&Discovered<'_>>>) {
        for (property, setters) in conflicting_setters {
            let getter_type = self.get_types.get(&property).cloned();
            let getter_ambiguous = self
                .get_methods
                .get(&property)
                .is_some_and(Invoker::is_ambiguous);
            let mut setter_ambiguous = false;
            let mut matched: Option<&Discovered<'_>> = None;
            for setter in setters {
                if !getter_ambiguous && getter_type.as_ref() == Some(&setter.param_type()) {
                    matched = Some(setter);
                    break;
                }
                if !setter_ambiguous {
                    matched = self.pick_better_setter(matched, setter, &property);
                    setter_ambiguous = matched.is_none();
                }
            }
            if let Some(setter) = matched {
                self.add_set_method(&property, setter);
            }
        }
    }

    fn pick_better_setter<'m, 'a>(
        &mut self,
        current: Option<&'m Discovered<'a>>,
        candidate: &'m Discovered<'a>,
        property: &str,
    ) -> Option<&'m Discovered<'a>> {
        let Some(current) = current else {
            return Some(candidate);
        };
        let current_type = current.param_type();
        let candidate_type = candidate.param_type();
        if current_type.is_assignable_from(&candidate_type) {
            return Some(candidate);
        }
        if candidate_type.is_assignable_from(&current_type) {
            return Some(current);
        }

        let message = format!(
            "Ambiguous setters defined for property '{}' in class '{}' with types '{}' and '{}'.",
            property, candidate.declaring_class, current_type, candidate_type
        );
        log::warn!("{message}");
        // The first candidate's type stays registered for later type lookups.
        self.set_methods.insert(
            property.to_string(),
            Invoker::Ambiguous(AmbiguousInvoker::new(
                property,
                candidate.declaring_class,
                vec![current.identity(), candidate.identity()],
                message,
                current_type.clone(),
            )),
        );
        self.set_types.insert(property.to_string(), current_type);
        None
    }

    fn add_set_method(&mut self, name: &str, method: &Discovered<'_>) {
        let value_type = method.param_type();
        self.set_methods.insert(
            name.to_string(),
            Invoker::Method(MethodInvoker::new(
                name,
                value_type.clone(),
                method.decl.body.clone(),
            )),
        );
        self.set_types.insert(name.to_string(), value_type);
    }

    /// `shadowed` holds field names declared by nearer layers; ancestors never
    /// contribute an accessor for them, even when the nearer field is read-only.
    fn add_fields(
        &mut self,
        layer: &ClassDescriptor,
        env: &TypeEnv,
        shadowed: &mut FxHashSet<String>,
    ) {
        for field in &layer.fields {
            if !shadowed.insert(field.name.clone()) {
                continue;
            }
            if !self.set_methods.contains_key(&field.name) {
                let constant = field.modifiers.is_final && field.modifiers.is_static;
                if !constant {
                    self.add_set_field(field, env);
                }
            }
            if !self.get_methods.contains_key(&field.name) {
                self.add_get_field(field, env);
            }
        }
        if let Some(superclass) = layer.superclass.as_deref() {
            let super_env = supertype_env(superclass, env);
            self.add_fields(&superclass.descriptor, &super_env, shadowed);
        }
    }

    fn add_set_field(&mut self, field: &FieldDecl, env: &TypeEnv) {
        let Some(write) = field.set.clone() else {
            return;
        };
        if is_valid_property_name(&field.name) {
            let value_type = field.ty.bind(env).erased();
            self.set_methods.insert(
                field.name.clone(),
                Invoker::Field(FieldInvoker::setter(&field.name, value_type.clone(), write)),
            );
            self.set_types.insert(field.name.clone(), value_type);
        }
    }

    fn add_get_field(&mut self, field: &FieldDecl, env: &TypeEnv) {
        if is_valid_property_name(&field.name) {
            let value_type = field.ty.bind(env).erased();
            self.get_methods.insert(
                field.name.clone(),
                Invoker::Field(FieldInvoker::getter(&field.name, value_type.clone(), field.get.clone())),
            );
            self.get_types.insert(field.name.clone(), value_type);
        }
    }

    /// Cache key of the described type
    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Class name from the descriptor
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Whether a no-argument constructor was declared
    pub fn has_default_constructor(&self) -> bool {
        self.default_constructor.is_some()
    }

    /// The no-argument constructor
    pub fn default_constructor(&self) -> ReflectionResult<ConstructFn> {
        self.default_constructor
            .clone()
            .ok_or_else(|| ReflectionError::NoDefaultConstructor {
                class: self.class_name.clone(),
            })
    }

    /// Create a fresh instance through the no-argument constructor
    pub fn instantiate(&self) -> ReflectionResult<HostObject> {
        let construct = self.default_constructor()?;
        Ok(HostObject::from_boxed(construct()))
    }

    /// Write accessor for `property`
    pub fn get_set_invoker(&self, property: &str) -> ReflectionResult<&Invoker> {
        self.set_methods
            .get(property)
            .ok_or_else(|| self.no_setter(property))
    }

    /// Read accessor for `property`
    pub fn get_get_invoker(&self, property: &str) -> ReflectionResult<&Invoker> {
        self.get_methods
            .get(property)
            .ok_or_else(|| self.no_getter(property))
    }

    /// Declared type accepted by the setter of `property`
    pub fn setter_type(&self, property: &str) -> ReflectionResult<&TypeDescriptor> {
        self.set_types
            .get(property)
            .ok_or_else(|| self.no_setter(property))
    }

    /// Declared type returned by the getter of `property`
    pub fn getter_type(&self, property: &str) -> ReflectionResult<&TypeDescriptor> {
        self.get_types
            .get(property)
            .ok_or_else(|| self.no_getter(property))
    }

    /// Readable property names, sorted
    pub fn readable_property_names(&self) -> &[String] {
        &self.readable_property_names
    }

    /// Writable property names, sorted
    pub fn writable_property_names(&self) -> &[String] {
        &self.writable_property_names
    }

    /// Whether `property` is readable
    pub fn has_getter(&self, property: &str) -> bool {
        self.get_methods.contains_key(property)
    }

    /// Whether `property` is writable
    pub fn has_setter(&self, property: &str) -> bool {
        self.set_methods.contains_key(property)
    }

    /// Canonical spelling of a property name given in any case
    pub fn find_property_name(&self, name: &str) -> Option<&str> {
        self.case_insensitive_property_map
            .get(&name.to_uppercase())
            .map(String::as_str)
    }

    /// Read `property` from a value of the described type
    pub fn get_value(&self, target: &dyn Any, property: &str) -> ReflectionResult<Value> {
        self.get_get_invoker(property)?.get(target)
    }

    /// Write `property` on a value of the described type
    pub fn set_value(&self, target: &mut dyn Any, property: &str, value: Value) -> ReflectionResult<()> {
        self.get_set_invoker(property)?.set(target, value)
    }

    /// Read `property` from a shared host object
    pub fn read(&self, object: &HostObject, property: &str) -> ReflectionResult<Value> {
        let invoker = self.get_get_invoker(property)?;
        object.read(|target| invoker.get(target))
    }

    /// Write `property` on a shared host object
    pub fn write(&self, object: &HostObject, property: &str, value: Value) -> ReflectionResult<()> {
        let invoker = self.get_set_invoker(property)?;
        object.write(|target| invoker.set(target, value))
    }

    fn no_getter(&self, property: &str) -> ReflectionError {
        ReflectionError::NoSuchReadableProperty {
            property: property.to_string(),
            class: self.class_name.clone(),
        }
    }

    fn no_setter(&self, property: &str) -> ReflectionError {
        ReflectionError::NoSuchWritableProperty {
            property: property.to_string(),
            class: self.class_name.clone(),
        }
    }
}

impl std::fmt::Debug for Reflector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reflector")
            .field("class", &self.class_name)
            .field("readable", &self.readable_property_names)
            .field("writable", &self.writable_property_names)
            .field("default_constructor", &self.default_constructor.is_some())
            .finish()
    }
}

fn add_method_conflict<'m, 'a>(
    conflicting: &mut IndexMap<String, Vec<&'m Discovered<'a>>>,
    method: &'m Discovered<'a>,
) {
    let Ok(property) = method_to_property(&method.decl.name) else {
        return;
    };
    if is_valid_property_name(&property) {
        conflicting.entry(property).or_default().push(method);
    }
}

fn supertype_env(supertype: &Supertype, env: &TypeEnv) -> TypeEnv {
    supertype
        .descriptor
        .type_params
        .iter()
        .zip(supertype.type_args.iter())
        .map(|(param, arg)| (param.clone(), arg.bind(env)))
        .collect()
}

/// All methods of the class, its interfaces and its ancestors, one per signature
fn class_methods(descriptor: &ClassDescriptor) -> Vec<Discovered<'_>> {
    let mut unique: IndexMap<String, Discovered<'_>> = IndexMap::new();
    let mut current = Some((descriptor, TypeEnv::default()));
    while let Some((layer, env)) = current {
        add_unique_methods(&mut unique, layer, &env);
        for interface in &layer.interfaces {
            add_interface_methods(&mut unique, interface, &env);
        }
        current = layer
            .superclass
            .as_deref()
            .map(|superclass| (&superclass.descriptor, supertype_env(superclass, &env)));
    }
    unique.into_values().collect()
}

fn add_interface_methods<'a>(
    unique: &mut IndexMap<String, Discovered<'a>>,
    interface: &'a Supertype,
    env: &TypeEnv,
) {
    let interface_env = supertype_env(interface, env);
    add_unique_methods(unique, &interface.descriptor, &interface_env);
    for parent in &interface.descriptor.interfaces {
        add_interface_methods(unique, parent, &interface_env);
    }
}

fn add_unique_methods<'a>(
    unique: &mut IndexMap<String, Discovered<'a>>,
    layer: &'a ClassDescriptor,
    env: &TypeEnv,
) {
    for method in layer.methods.iter().filter(|m| !m.bridge) {
        unique.entry(method.signature()).or_insert_with(|| Discovered {
            decl: method,
            declaring_class: layer.name(),
            env: env.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::{NamedType, Supertype};
    use rstest::rstest;

    #[derive(Debug, Clone, Default)]
    struct Kennel {
        id: i64,
        name: String,
        active: bool,
        code: Value,
        nickname: String,
        inherited: String,
    }

    impl Describe for Kennel {
        fn describe() -> ClassDescriptor {
            ClassDescriptor::builder::<Kennel>("Kennel")
                .default_constructor()
                .getter("getName", TypeDescriptor::String, |k: &Kennel| k.name.clone())
                .setter("setName", TypeDescriptor::String, |k: &mut Kennel, v: String| k.name = v)
                .build()
        }
    }

    fn animal() -> NamedType {
        NamedType::new("Animal")
    }

    fn dog() -> NamedType {
        NamedType::new("Dog").extends(animal())
    }

    fn reflect(descriptor: ClassDescriptor) -> Reflector {
        Reflector::new(TypeKey::of::<Kennel>(), &descriptor)
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_more_specific_getter_wins_in_any_order(#[case] specific_first: bool) {
        let general = ("getPet", TypeDescriptor::named(animal()));
        let specific = ("getPet", TypeDescriptor::named(dog()));
        let (first, second) = if specific_first {
            (specific, general)
        } else {
            (general, specific)
        };
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .getter(first.0, first.1, |_: &Kennel| Value::Null)
                .getter(second.0, second.1, |_: &Kennel| Value::Null)
                .build(),
        );

        assert_eq!(
            reflector.getter_type("pet").unwrap(),
            &TypeDescriptor::named(dog())
        );
        assert!(!reflector.get_get_invoker("pet").unwrap().is_ambiguous());
    }

    #[test]
    fn test_scalar_override_of_generic_getter_wins() {
        let entity = ClassDescriptor::builder::<Kennel>("Entity")
            .type_params(["ID"])
            .getter("getId", TypeDescriptor::var("ID"), |_: &Kennel| Value::Null)
            .build();
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .extends(Supertype::generic(entity, vec![TypeDescriptor::Long]))
                .getter("getId", TypeDescriptor::Long, |k: &Kennel| k.id)
                .build(),
        );

        assert_eq!(reflector.getter_type("id").unwrap(), &TypeDescriptor::Long);
        assert!(!reflector.get_get_invoker("id").unwrap().is_ambiguous());
        let kennel = Kennel {
            id: 7,
            ..Kennel::default()
        };
        assert_eq!(
            reflector.get_value(&kennel as &dyn Any, "id").unwrap(),
            Value::Integer(7)
        );
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_boolean_is_prefix_wins(#[case] is_first: bool) {
        let builder = ClassDescriptor::builder::<Kennel>("Kennel");
        let builder = if is_first {
            builder
                .getter("isActive", TypeDescriptor::Boolean, |k: &Kennel| k.active)
                .getter("getActive", TypeDescriptor::Boolean, |_: &Kennel| false)
        } else {
            builder
                .getter("getActive", TypeDescriptor::Boolean, |_: &Kennel| false)
                .getter("isActive", TypeDescriptor::Boolean, |k: &Kennel| k.active)
        };
        let reflector = reflect(builder.build());

        let kennel = Kennel {
            active: true,
            ..Kennel::default()
        };
        assert_eq!(
            reflector.get_value(&kennel as &dyn Any, "active").unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_unrelated_getters_are_ambiguous_on_use() {
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .getter("getCode", TypeDescriptor::String, |_: &Kennel| "x")
                .getter("getCode", TypeDescriptor::Long, |_: &Kennel| 1i64)
                .build(),
        );

        assert!(reflector.has_getter("code"));
        assert_eq!(reflector.readable_property_names(), ["code"]);
        assert_eq!(reflector.getter_type("code").unwrap(), &TypeDescriptor::String);

        let err = reflector
            .get_value(&Kennel::default() as &dyn Any, "code")
            .unwrap_err();
        let ReflectionError::AmbiguousAccessor {
            property,
            class,
            candidates,
            message,
        } = err
        else {
            panic!("expected an ambiguous accessor error");
        };
        assert_eq!(property, "code");
        assert_eq!(class, "Kennel");
        assert_eq!(candidates.len(), 2);
        assert!(message.contains("Illegal overloaded getter method"));
    }

    #[test]
    fn test_same_type_getters_are_ambiguous() {
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .getter("getName", TypeDescriptor::String, |k: &Kennel| k.name.clone())
                .getter("getname", TypeDescriptor::String, |k: &Kennel| k.name.clone())
                .build(),
        );
        assert!(reflector.get_get_invoker("name").unwrap().is_ambiguous());
    }

    #[test]
    fn test_setter_matching_getter_type_wins() {
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .getter("getName", TypeDescriptor::String, |k: &Kennel| k.name.clone())
                .setter("setName", TypeDescriptor::Any, |_: &mut Kennel, _: Value| {})
                .setter("setName", TypeDescriptor::String, |k: &mut Kennel, v: String| k.name = v)
                .build(),
        );

        assert_eq!(reflector.setter_type("name").unwrap(), &TypeDescriptor::String);
        let mut kennel = Kennel::default();
        reflector
            .set_value(&mut kennel as &mut dyn Any, "name", Value::from("Rex"))
            .unwrap();
        assert_eq!(kennel.name, "Rex");
    }

    #[test]
    fn test_more_specific_setter_wins_without_getter() {
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .setter("setPet", TypeDescriptor::named(animal()), |_: &mut Kennel, _: Value| {})
                .setter("setPet", TypeDescriptor::named(dog()), |_: &mut Kennel, _: Value| {})
                .build(),
        );
        assert_eq!(
            reflector.setter_type("pet").unwrap(),
            &TypeDescriptor::named(dog())
        );
    }

    #[test]
    fn test_ambiguous_setter_keeps_first_type() {
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .setter("setCode", TypeDescriptor::String, |k: &mut Kennel, v: Value| k.code = v)
                .setter("setCode", TypeDescriptor::Long, |k: &mut Kennel, v: Value| k.code = v)
                .build(),
        );

        assert!(reflector.has_setter("code"));
        assert_eq!(reflector.setter_type("code").unwrap(), &TypeDescriptor::String);
        let err = reflector
            .set_value(&mut Kennel::default() as &mut dyn Any, "code", Value::from("x"))
            .unwrap_err();
        assert!(err.is_ambiguous());
        assert!(err.to_string().contains("Ambiguous setters"));
    }

    #[test]
    fn test_exact_setter_after_ambiguity_replaces_it() {
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .getter("getCode", TypeDescriptor::Long, |k: &Kennel| k.code.clone())
                .setter("setCode", TypeDescriptor::String, |_: &mut Kennel, _: Value| {})
                .setter("setCode", TypeDescriptor::Decimal, |_: &mut Kennel, _: Value| {})
                .setter("setCode", TypeDescriptor::Long, |k: &mut Kennel, v: i64| {
                    k.code = Value::Integer(v)
                })
                .build(),
        );

        assert_eq!(reflector.setter_type("code").unwrap(), &TypeDescriptor::Long);
        let mut kennel = Kennel::default();
        reflector
            .set_value(&mut kennel as &mut dyn Any, "code", Value::Integer(5))
            .unwrap();
        assert_eq!(kennel.code, Value::Integer(5));
    }

    #[test]
    fn test_fields_fill_in_missing_accessors() {
        let base = ClassDescriptor::builder::<Kennel>("Base")
            .field(
                "inherited",
                TypeDescriptor::String,
                |k: &Kennel| k.inherited.clone(),
                |k: &mut Kennel, v: String| k.inherited = v,
            )
            .field(
                "nickname",
                TypeDescriptor::Long,
                |_: &Kennel| 0i64,
                |_: &mut Kennel, _: i64| {},
            )
            .build();
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .extends(Supertype::new(base))
                .getter("getName", TypeDescriptor::String, |k: &Kennel| k.name.clone())
                .field(
                    "name",
                    TypeDescriptor::String,
                    |_: &Kennel| String::from("field"),
                    |_: &mut Kennel, _: String| {},
                )
                .field(
                    "nickname",
                    TypeDescriptor::String,
                    |k: &Kennel| k.nickname.clone(),
                    |k: &mut Kennel, v: String| k.nickname = v,
                )
                .final_field("id", TypeDescriptor::Long, |_: &Kennel| 42i64)
                .static_final_field("MAX_DOGS", TypeDescriptor::Integer, |_: &Kennel| 10i64)
                .field(
                    "$coverage",
                    TypeDescriptor::Any,
                    |_: &Kennel| Value::Null,
                    |_: &mut Kennel, _: Value| {},
                )
                .field(
                    "serialVersionUID",
                    TypeDescriptor::Long,
                    |_: &Kennel| 1i64,
                    |_: &mut Kennel, _: i64| {},
                )
                .build(),
        );

        assert_eq!(
            reflector.readable_property_names(),
            ["MAX_DOGS", "id", "inherited", "name", "nickname"]
        );
        assert_eq!(reflector.writable_property_names(), ["inherited", "name", "nickname"]);
        // Subclass field shadows the superclass field of the same name
        assert_eq!(reflector.getter_type("nickname").unwrap(), &TypeDescriptor::String);

        let mut kennel = Kennel {
            name: "Rex".to_string(),
            ..Kennel::default()
        };
        assert_eq!(
            reflector.get_value(&kennel as &dyn Any, "name").unwrap(),
            Value::from("Rex")
        );
        reflector
            .set_value(&mut kennel as &mut dyn Any, "inherited", Value::from("yes"))
            .unwrap();
        assert_eq!(kennel.inherited, "yes");
        assert_eq!(
            reflector.get_value(&kennel as &dyn Any, "MAX_DOGS").unwrap(),
            Value::Integer(10)
        );
        assert!(matches!(
            reflector.set_value(&mut kennel as &mut dyn Any, "id", Value::Integer(1)),
            Err(ReflectionError::NoSuchWritableProperty { .. })
        ));
    }

    #[test]
    fn test_read_only_fields_shadow_ancestor_fields() {
        let base = ClassDescriptor::builder::<Kennel>("Base")
            .field(
                "id",
                TypeDescriptor::String,
                |k: &Kennel| k.name.clone(),
                |k: &mut Kennel, v: String| k.name = v,
            )
            .field(
                "LIMIT",
                TypeDescriptor::Integer,
                |_: &Kennel| 1i64,
                |_: &mut Kennel, _: i64| {},
            )
            .build();
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .extends(Supertype::new(base))
                .final_field("id", TypeDescriptor::Long, |k: &Kennel| k.id)
                .static_final_field("LIMIT", TypeDescriptor::Integer, |_: &Kennel| 10i64)
                .build(),
        );

        assert_eq!(reflector.readable_property_names(), ["LIMIT", "id"]);
        assert!(reflector.writable_property_names().is_empty());
        assert_eq!(reflector.getter_type("id").unwrap(), &TypeDescriptor::Long);
        assert!(reflector.setter_type("id").is_err());
        assert!(!reflector.has_setter("LIMIT"));

        let mut kennel = Kennel::default();
        assert!(matches!(
            reflector.set_value(&mut kennel as &mut dyn Any, "id", Value::from("x")),
            Err(ReflectionError::NoSuchWritableProperty { .. })
        ));
        assert_eq!(kennel.name, "");
    }

    #[test]
    fn test_generic_accessors_resolve_against_subclass() {
        let entity = ClassDescriptor::builder::<Kennel>("Entity")
            .type_params(["ID"])
            .getter("getId", TypeDescriptor::var("ID"), |k: &Kennel| k.name.clone())
            .setter("setId", TypeDescriptor::var("ID"), |k: &mut Kennel, v: String| k.name = v)
            .getter("getIds", TypeDescriptor::list(TypeDescriptor::var("ID")), |_: &Kennel| {
                Value::List(Vec::new())
            })
            .build();
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .extends(Supertype::generic(entity, vec![TypeDescriptor::String]))
                .build(),
        );

        assert_eq!(reflector.getter_type("id").unwrap(), &TypeDescriptor::String);
        assert_eq!(reflector.setter_type("id").unwrap(), &TypeDescriptor::String);
        assert_eq!(
            reflector.getter_type("ids").unwrap(),
            &TypeDescriptor::list(TypeDescriptor::String)
        );
    }

    #[test]
    fn test_overrides_and_interfaces() {
        let labelled = ClassDescriptor::builder::<Kennel>("Labelled")
            .getter("getLabel", TypeDescriptor::String, |_: &Kennel| "interface")
            .build();
        let base = ClassDescriptor::builder::<Kennel>("Base")
            .getter("getName", TypeDescriptor::String, |_: &Kennel| "base")
            .build();
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("Kennel")
                .extends(Supertype::new(base))
                .implements(Supertype::new(labelled))
                .getter("getName", TypeDescriptor::String, |_: &Kennel| "override")
                .bridge_getter("getBridged", TypeDescriptor::Any, |_: &Kennel| Value::Null)
                .getter("getClass", TypeDescriptor::Any, |_: &Kennel| Value::Null)
                .method("compute", vec![], TypeDescriptor::Long)
                .build(),
        );

        let kennel = Kennel::default();
        assert_eq!(reflector.readable_property_names(), ["label", "name"]);
        assert_eq!(
            reflector.get_value(&kennel as &dyn Any, "name").unwrap(),
            Value::from("override")
        );
        assert_eq!(
            reflector.get_value(&kennel as &dyn Any, "label").unwrap(),
            Value::from("interface")
        );
    }

    #[test]
    fn test_record_components() {
        let reflector = reflect(
            ClassDescriptor::builder::<Kennel>("KennelRecord")
                .record()
                .getter("name", TypeDescriptor::String, |k: &Kennel| k.name.clone())
                .getter("active", TypeDescriptor::Boolean, |k: &Kennel| k.active)
                .setter("setName", TypeDescriptor::String, |k: &mut Kennel, v: String| k.name = v)
                .final_field("nickname", TypeDescriptor::String, |k: &Kennel| k.nickname.clone())
                .build(),
        );

        assert_eq!(reflector.readable_property_names(), ["active", "name"]);
        assert!(reflector.writable_property_names().is_empty());
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let reflector = Reflector::for_type::<Kennel>();
        assert_eq!(reflector.find_property_name("NAME"), Some("name"));
        assert_eq!(reflector.find_property_name("nAmE"), Some("name"));
        assert_eq!(reflector.find_property_name("missing"), None);
    }

    #[test]
    fn test_default_constructor() {
        let reflector = Reflector::for_type::<Kennel>();
        assert!(reflector.has_default_constructor());
        let object = reflector.instantiate().unwrap();
        reflector.write(&object, "name", Value::from("Rex")).unwrap();
        assert_eq!(reflector.read(&object, "name").unwrap(), Value::from("Rex"));

        let without = reflect(ClassDescriptor::builder::<Kennel>("Kennel").build());
        assert!(!without.has_default_constructor());
        assert!(matches!(
            without.instantiate(),
            Err(ReflectionError::NoDefaultConstructor { class }) if class == "Kennel"
        ));
    }

    #[test]
    fn test_missing_properties() {
        let reflector = Reflector::for_type::<Kennel>();
        assert!(matches!(
            reflector.getter_type("age"),
            Err(ReflectionError::NoSuchReadableProperty { .. })
        ));
        assert!(matches!(
            reflector.setter_type("age"),
            Err(ReflectionError::NoSuchWritableProperty { .. })
        ));
    }
}
