//! Dispatch semantics: override selection, fall-through, constructor
//! interception, and the accessor façade

mod common;

use umbra_core::{
    ParamType, RealClassBuilder, Runtime, ShadowClassBuilder, UmbraError, Value,
};

/// Real-side state recording whether real bodies ever ran
struct WidgetState {
    id: i64,
    real_get_ran: bool,
}

/// Shadow-side state recording hook and override activity
struct ShadowWidgetState {
    hook_args: Option<Vec<Value>>,
    id: i64,
}

fn widget_runtime() -> Runtime {
    common::init_tracing();
    let mut builder = Runtime::builder();
    builder.register_class(
        RealClassBuilder::new("Widget")
            .state(|| WidgetState {
                id: -1,
                real_get_ran: false,
            })
            .method("id", &[], |env, _args| {
                env.real_state(|s: &mut WidgetState| {
                    s.real_get_ran = true;
                    Value::int(s.id)
                })
            })
            .method("set", &[ParamType::Int], |env, args| {
                let v = args[0].as_i64().unwrap_or(0);
                env.real_state(|s: &mut WidgetState| s.id = v)?;
                Ok(Value::null())
            })
            .method("set", &[ParamType::Str], |_env, _args| {
                Ok(Value::str("real set(str)"))
            })
            .build(),
    );
    builder.register_shadow_class(
        ShadowClassBuilder::new("ShadowWidget")
            .state(|| ShadowWidgetState {
                hook_args: None,
                id: 42,
            })
            .ctor_hook(&[], |env, args| {
                env.shadow_state(|s: &mut ShadowWidgetState| s.hook_args = Some(args.to_vec()))?;
                Ok(())
            })
            .ctor_hook(&[ParamType::Int], |env, args| {
                env.shadow_state(|s: &mut ShadowWidgetState| {
                    s.hook_args = Some(args.to_vec());
                    s.id = args[0].as_i64().unwrap_or(0);
                })?;
                Ok(())
            })
            .method("id", &[], |env, _args| {
                env.shadow_state(|s: &mut ShadowWidgetState| Value::int(s.id))
            })
            .method("set", &[ParamType::Int], |env, args| {
                let v = args[0].as_i64().unwrap_or(0);
                env.shadow_state(|s: &mut ShadowWidgetState| s.id = v)?;
                Ok(Value::null())
            })
            .build(),
    );
    builder.register_shadow("Widget", "ShadowWidget");
    builder.build().unwrap()
}

#[test]
fn test_create_binds_and_invokes_hook() {
    let rt = widget_runtime();
    let widget = rt.create("Widget", &[]).unwrap();

    let shadow = rt.shadow_of(&widget).unwrap();
    let hook_args = shadow
        .with_state(|s: &mut ShadowWidgetState| s.hook_args.clone())
        .unwrap();
    assert_eq!(hook_args, Some(vec![]));
}

#[test]
fn test_shadow_of_is_stable() {
    let rt = widget_runtime();
    let widget = rt.create("Widget", &[]).unwrap();

    let first = rt.shadow_of(&widget).unwrap();
    let second = rt.shadow_of(&widget).unwrap();
    assert_eq!(first.id(), second.id());
}

#[test]
fn test_override_runs_instead_of_real_body() {
    let rt = widget_runtime();
    let widget = rt.create("Widget", &[]).unwrap();

    assert_eq!(rt.invoke(&widget, "id", &[]).unwrap(), Value::int(42));
    assert_eq!(rt.invoke(&widget, "id", &[]).unwrap(), Value::int(42));

    // the real body never ran
    let real_ran = widget
        .with_state(|s: &mut WidgetState| s.real_get_ran)
        .unwrap();
    assert!(!real_ran);
}

#[test]
fn test_unmatched_overload_falls_through() {
    let rt = widget_runtime();
    let widget = rt.create("Widget", &[]).unwrap();

    // the shadow overrides set(int) but not set(str); no implicit widening
    rt.invoke(&widget, "set", &[Value::int(7)]).unwrap();
    let shadow_id = rt
        .shadow_of(&widget)
        .unwrap()
        .with_state(|s: &mut ShadowWidgetState| s.id)
        .unwrap();
    assert_eq!(shadow_id, 7);

    let result = rt.invoke(&widget, "set", &[Value::str("x")]).unwrap();
    assert_eq!(result, Value::str("real set(str)"));
}

#[test]
fn test_hook_overload_selects_by_tags() {
    let rt = widget_runtime();
    let widget = rt.create("Widget", &[Value::int(9)]).unwrap();

    assert_eq!(rt.invoke(&widget, "id", &[]).unwrap(), Value::int(9));
}

#[test]
fn test_unmatched_hook_fails_construction() {
    let rt = widget_runtime();
    let err = rt.create("Widget", &[Value::str("nope")]).unwrap_err();
    assert!(matches!(err, UmbraError::ShadowInstantiation { .. }));
    assert_eq!(rt.binding_count(), 0);
}

#[test]
fn test_failing_hook_rolls_back_binding() {
    common::init_tracing();
    let mut builder = Runtime::builder();
    builder.register_class(RealClassBuilder::new("Widget").build());
    builder.register_shadow_class(
        ShadowClassBuilder::new("ShadowWidget")
            .ctor_hook(&[], |_env, _args| Err(UmbraError::Method("hook failed".into())))
            .build(),
    );
    builder.register_shadow("Widget", "ShadowWidget");
    let rt = builder.build().unwrap();

    let err = rt.create("Widget", &[]).unwrap_err();
    match err {
        UmbraError::ShadowInstantiation { reason, .. } => {
            assert!(reason.contains("hook failed"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(rt.binding_count(), 0);
}

#[test]
fn test_hookless_shadow_skips_notification() {
    common::init_tracing();
    let mut builder = Runtime::builder();
    builder.register_class(RealClassBuilder::new("Widget").build());
    builder.register_shadow_class(ShadowClassBuilder::new("ShadowWidget").build());
    builder.register_shadow("Widget", "ShadowWidget");
    let rt = builder.build().unwrap();

    // no hooks declared anywhere in the chain: arguments are accepted as-is
    let widget = rt.create("Widget", &[Value::int(5)]).unwrap();
    assert!(rt.shadow_of(&widget).is_ok());
}

#[test]
fn test_pass_through_transparency() {
    common::init_tracing();
    let mut builder = Runtime::builder();
    builder.register_class(
        RealClassBuilder::new("Plain")
            .state(|| 0i64)
            .method("bump", &[], |env, _args| {
                env.real_state(|s: &mut i64| {
                    *s += 1;
                    Value::int(*s)
                })
            })
            .build(),
    );
    let rt = builder.build().unwrap();

    let plain = rt.create("Plain", &[]).unwrap();
    assert_eq!(rt.invoke(&plain, "bump", &[]).unwrap(), Value::int(1));
    assert_eq!(rt.invoke(&plain, "bump", &[]).unwrap(), Value::int(2));

    let err = rt.shadow_of(&plain).unwrap_err();
    assert!(matches!(err, UmbraError::NoShadowBound { class } if class == "Plain"));
    assert_eq!(rt.binding_count(), 0);
}

#[test]
fn test_ancestor_fallback_binds_base_shadow() {
    common::init_tracing();
    let mut builder = Runtime::builder();
    let base = builder.register_class(
        RealClassBuilder::new("Base")
            .method("kind", &[], |_env, _args| Ok(Value::str("real")))
            .build(),
    );
    builder.register_class(RealClassBuilder::new("Sub").parent(base).build());
    builder.register_shadow_class(
        ShadowClassBuilder::new("ShadowBase")
            .method("kind", &[], |_env, _args| Ok(Value::str("shadow")))
            .build(),
    );
    builder.register_shadow("Base", "ShadowBase");
    let rt = builder.build().unwrap();

    // Sub has no dedicated shadow: the Base shadow covers it
    let sub = rt.create("Sub", &[]).unwrap();
    let shadow = rt.shadow_of(&sub).unwrap();
    assert!(shadow.real().is_some());

    // and the override found via the ancestor path dispatches
    assert_eq!(rt.invoke(&sub, "kind", &[]).unwrap(), Value::str("shadow"));
}

#[test]
fn test_inherited_override_uses_declaring_state() {
    common::init_tracing();

    struct BaseState {
        id: i64,
    }
    struct DerivedState {
        text: String,
    }

    let mut builder = Runtime::builder();
    let view = builder.register_class(RealClassBuilder::new("View").build());
    builder.register_class(RealClassBuilder::new("TextView").parent(view).build());
    let shadow_view = builder.register_shadow_class(
        ShadowClassBuilder::new("ShadowView")
            .state(|| BaseState { id: 0 })
            .method("set_id", &[ParamType::Int], |env, args| {
                let v = args[0].as_i64().unwrap_or(0);
                env.shadow_state(|s: &mut BaseState| s.id = v)?;
                Ok(Value::null())
            })
            .method("id", &[], |env, _args| {
                env.shadow_state(|s: &mut BaseState| Value::int(s.id))
            })
            .build(),
    );
    builder.register_shadow_class(
        ShadowClassBuilder::new("ShadowTextView")
            .parent(shadow_view)
            .state(|| DerivedState {
                text: String::new(),
            })
            .method("set_text", &[ParamType::Str], |env, args| {
                let t = args[0].as_str().unwrap_or("").to_string();
                env.shadow_state(|s: &mut DerivedState| s.text = t)?;
                Ok(Value::null())
            })
            .method("text", &[], |env, _args| {
                env.shadow_state(|s: &mut DerivedState| Value::str(s.text.clone()))
            })
            .build(),
    );
    builder.register_shadow("View", "ShadowView");
    builder.register_shadow("TextView", "ShadowTextView");
    let rt = builder.build().unwrap();

    let tv = rt.create("TextView", &[]).unwrap();

    // inherited override writes the base class's state slot
    rt.invoke(&tv, "set_id", &[Value::int(11)]).unwrap();
    rt.invoke(&tv, "set_text", &[Value::str("hello")]).unwrap();
    assert_eq!(rt.invoke(&tv, "id", &[]).unwrap(), Value::int(11));
    assert_eq!(rt.invoke(&tv, "text", &[]).unwrap(), Value::str("hello"));

    // both slots are inspectable on the one shadow instance
    let shadow = rt.shadow_of(&tv).unwrap();
    assert_eq!(shadow.with_state(|s: &mut BaseState| s.id).unwrap(), 11);
    assert_eq!(
        shadow
            .with_state(|s: &mut DerivedState| s.text.clone())
            .unwrap(),
        "hello"
    );
}

#[test]
fn test_method_errors_pass_through() {
    common::init_tracing();
    let mut builder = Runtime::builder();
    builder.register_class(RealClassBuilder::new("Widget").build());
    builder.register_shadow_class(
        ShadowClassBuilder::new("ShadowWidget")
            .method("explode", &[], |_env, _args| {
                Err(UmbraError::Method("boom".into()))
            })
            .build(),
    );
    builder.register_shadow("Widget", "ShadowWidget");
    let rt = builder.build().unwrap();

    let widget = rt.create("Widget", &[]).unwrap();
    let err = rt.invoke(&widget, "explode", &[]).unwrap_err();
    assert!(matches!(err, UmbraError::Method(msg) if msg == "boom"));
}

#[test]
fn test_unknown_method() {
    let rt = widget_runtime();
    let widget = rt.create("Widget", &[]).unwrap();

    let err = rt.invoke(&widget, "vanish", &[]).unwrap_err();
    match err {
        UmbraError::UnknownMethod { class, sig } => {
            assert_eq!(class, "Widget");
            assert_eq!(sig, "vanish()");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_shadow_back_reference() {
    let rt = widget_runtime();
    let widget = rt.create("Widget", &[]).unwrap();

    let shadow = rt.shadow_of(&widget).unwrap();
    let back = shadow.real().unwrap();
    assert_eq!(back.id(), widget.id());
}

#[test]
fn test_proxy_for_reenters_dispatch() {
    let rt = widget_runtime();
    let widget = rt.create("Widget", &[]).unwrap();

    let handle = rt.proxy_for(&widget);
    rt.invoke(&handle, "set", &[Value::int(3)]).unwrap();
    assert_eq!(rt.invoke(&widget, "id", &[]).unwrap(), Value::int(3));
}
