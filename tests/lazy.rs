//! Lazy-loading tests: deferred materialization, eager/lazy equivalence, the module-wide
//! lock discipline and the finish operation.

mod common;

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use cildom::prelude::*;
use common::{corlib, load_with, module_of, public_method, public_type};

fn sample_module() -> Module {
    let mut ty = public_type(1, "N", "C");
    ty.base = Some(corlib("System", "Object"));
    ty.interfaces.push(InterfaceImpl::new(corlib("System", "IDisposable")));
    ty.methods.push(Arc::new(public_method(1, "M1", TypeSig::Void)));
    ty.methods.push(Arc::new(public_method(2, "M2", TypeSig::I4)));
    ty.fields.push(Field::new(
        Token::field(1),
        "F",
        FieldAttributes::PUBLIC,
        TypeSig::sz_array(TypeSig::String),
    ));
    ty.nested_types.push(Arc::new(TypeDef::new(
        Token::type_def(2),
        "",
        "Inner",
        TypeAttributes::NESTED_PUBLIC,
    )));
    module_of(vec![ty])
}

fn lazy_config() -> LoaderConfig {
    LoaderConfig {
        lazy_load: true,
        ..LoaderConfig::default()
    }
}

#[test]
fn lazy_loading_equals_eager_loading() {
    let eager = load_with(LoaderConfig::default(), sample_module());
    let lazy = load_with(lazy_config(), sample_module());

    let eager_td = &eager.types()[0];
    let lazy_td = &lazy.types()[0];

    assert_eq!(eager_td.name, lazy_td.name);
    assert_eq!(eager_td.kind, lazy_td.kind);
    assert_eq!(eager_td.accessibility, lazy_td.accessibility);

    assert_eq!(
        eager_td.base_types().unwrap(),
        lazy_td.base_types().unwrap(),
        "base types must be value-equal modulo interning"
    );

    let eager_members = eager_td.members().unwrap();
    let lazy_members = lazy_td.members().unwrap();
    assert_eq!(eager_members.len(), lazy_members.len());
    for (e, l) in eager_members.iter().zip(lazy_members.iter()) {
        assert_eq!(e.name(), l.name());
        assert_eq!(e.token(), l.token());
        assert_eq!(e.modifiers(), l.modifiers());
    }

    let eager_nested = eager_td.nested_types().unwrap();
    let lazy_nested = lazy_td.nested_types().unwrap();
    assert_eq!(eager_nested.len(), lazy_nested.len());
    assert_eq!(eager_nested[0].name, lazy_nested[0].name);
}

#[test]
fn lazy_member_callbacks_fire_on_first_access_only() {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let config = LoaderConfig {
        on_entity_loaded: Some(Arc::new(move |entity: &LoadedEntity| {
            if !matches!(entity, LoadedEntity::TypeDefinition(_)) {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        })),
        ..lazy_config()
    };
    let assembly = load_with(config, sample_module());
    assert_eq!(
        counter.load(Ordering::SeqCst),
        0,
        "no members materialized during the load"
    );

    let td = &assembly.types()[0];
    let members = td.members().unwrap();
    assert_eq!(members.len(), 3);
    assert_eq!(counter.load(Ordering::SeqCst), 3);

    // Published slots do not recompute.
    let again = td.members().unwrap();
    assert_eq!(again.len(), 3);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[test]
fn lazy_members_bind_declaring_type() {
    let assembly = load_with(lazy_config(), sample_module());
    let td = &assembly.types()[0];
    for member in td.members().unwrap().iter() {
        assert!(Arc::ptr_eq(&member.declaring_type().unwrap(), td));
    }
}

#[test]
fn finish_lazy_loading_materializes_everything() {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let config = LoaderConfig {
        on_entity_loaded: Some(Arc::new(move |_entity: &LoadedEntity| {
            seen.fetch_add(1, Ordering::SeqCst);
        })),
        ..lazy_config()
    };
    let assembly = load_with(config, sample_module());
    let after_load = counter.load(Ordering::SeqCst);

    assembly.finish_lazy_loading().unwrap();
    let after_finish = counter.load(Ordering::SeqCst);
    assert!(after_finish > after_load);

    // Slots stay published and accessors keep working after the source release.
    let td = &assembly.types()[0];
    assert_eq!(td.members().unwrap().len(), 3);
    assert_eq!(td.base_types().unwrap().len(), 2);
    assert_eq!(td.nested_types().unwrap().len(), 1);
    assert_eq!(counter.load(Ordering::SeqCst), after_finish);
}

#[test]
fn concurrent_materialization_publishes_once() {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let config = LoaderConfig {
        on_entity_loaded: Some(Arc::new(move |entity: &LoadedEntity| {
            if matches!(entity, LoadedEntity::Method(_)) {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        })),
        ..lazy_config()
    };
    let assembly = load_with(config, sample_module());
    let td = assembly.types()[0].clone();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let td = td.clone();
            std::thread::spawn(move || td.members().unwrap().len())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }

    // The winning writer computed the list exactly once.
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[test]
fn lazy_types_are_registered_at_load_time() {
    let counter = Arc::new(AtomicUsize::new(0));
    let seen = counter.clone();
    let config = LoaderConfig {
        on_entity_loaded: Some(Arc::new(move |entity: &LoadedEntity| {
            if matches!(entity, LoadedEntity::TypeDefinition(_)) {
                seen.fetch_add(1, Ordering::SeqCst);
            }
        })),
        ..lazy_config()
    };
    let assembly = load_with(config, sample_module());
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(assembly.types().len(), 1);
    assert!(assembly.type_by_token(Token::type_def(1)).is_some());
}

#[test]
fn lazy_nested_types_materialize_eagerly_once_accessed() {
    let assembly = load_with(lazy_config(), sample_module());
    let td = &assembly.types()[0];
    let nested = td.nested_types().unwrap();
    assert_eq!(nested.len(), 1);
    // Nested definitions come back fully initialized.
    assert_eq!(nested[0].members().unwrap().len(), 0);
    assert_eq!(nested[0].base_types().unwrap().len(), 0);
}
