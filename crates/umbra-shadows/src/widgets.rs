//! View-tree shadows
//!
//! `View` and `TextView` stand in for the host's widget classes; off-host
//! they are pure storage, so every interesting behavior lives in the shadows.
//! `ShadowView` keeps the tree structure: children are owned handles, the
//! parent link is weak and validated on every walk so a detached subtree
//! never keeps its old parent alive.

use std::sync::{Arc, Weak};

use umbra_core::{
    ParamType, RealClassBuilder, RealObject, RealRef, RuntimeBuilder, ShadowClassBuilder,
    ShadowClassDef, ShadowClassId, UmbraError, Value,
};

/// Shadow state for `View`
pub struct ShadowView {
    /// View id used by `find_view_by_id`
    pub id: i64,
    /// Child views, in insertion order
    pub children: Vec<RealRef>,
    /// Parent view, if attached
    pub parent: Option<Weak<RealObject>>,
    /// Visibility flag value
    pub visibility: i64,
    /// Selection flag
    pub selected: bool,
}

impl Default for ShadowView {
    fn default() -> Self {
        Self {
            id: -1,
            children: Vec::new(),
            parent: None,
            visibility: 0,
            selected: false,
        }
    }
}

/// Shadow state for `TextView`
#[derive(Default)]
pub struct ShadowTextView {
    /// Current text content
    pub text: String,
}

/// Register the widget classes and their shadows
pub fn install(builder: &mut RuntimeBuilder) {
    let view = builder.register_class(RealClassBuilder::new("View").build());
    builder.register_class(RealClassBuilder::new("TextView").parent(view).build());

    let shadow_view = builder.register_shadow_class(shadow_view_def());
    builder.register_shadow_class(shadow_text_view_def(shadow_view));

    builder.register_shadow("View", "ShadowView");
    builder.register_shadow("TextView", "ShadowTextView");
}

fn expect_view_arg(args: &[Value]) -> Result<RealRef, UmbraError> {
    args.first()
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| UmbraError::Method("expected a view argument".into()))
}

fn shadow_view_def() -> ShadowClassDef {
    ShadowClassBuilder::new("ShadowView")
        .state(ShadowView::default)
        .ctor_hook(&[], |_env, _args| Ok(()))
        .ctor_hook(&[ParamType::Int], |env, args| {
            let id = args[0].as_i64().unwrap_or(-1);
            env.shadow_state(|s: &mut ShadowView| s.id = id)?;
            Ok(())
        })
        .method("set_id", &[ParamType::Int], |env, args| {
            let id = args[0].as_i64().unwrap_or(-1);
            env.shadow_state(|s: &mut ShadowView| s.id = id)?;
            Ok(Value::null())
        })
        .method("id", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowView| Value::int(s.id))
        })
        .method("add_view", &[ParamType::Object], |env, args| {
            let child = expect_view_arg(args)?;
            // wire the child's shadow to its new parent through dispatch
            let handle = env.runtime().proxy_for(&child);
            let child_shadow = env.runtime().shadow_of(&handle)?;
            child_shadow
                .with_state(|s: &mut ShadowView| s.parent = Some(Arc::downgrade(env.receiver())))?;
            env.shadow_state(|s: &mut ShadowView| s.children.push(child))?;
            Ok(Value::null())
        })
        .method("remove_all_views", &[], |env, _args| {
            let children = env.shadow_state(|s: &mut ShadowView| std::mem::take(&mut s.children))?;
            for child in children {
                let child_shadow = env.runtime().shadow_of(&child)?;
                child_shadow.with_state(|s: &mut ShadowView| s.parent = None)?;
            }
            Ok(Value::null())
        })
        .method("child_count", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowView| Value::int(s.children.len() as i64))
        })
        .method("child_at", &[ParamType::Int], |env, args| {
            let index = args[0].as_i64().unwrap_or(-1);
            let child = env.shadow_state(|s: &mut ShadowView| {
                usize::try_from(index)
                    .ok()
                    .and_then(|i| s.children.get(i).cloned())
            })?;
            child
                .map(Value::object)
                .ok_or_else(|| UmbraError::Method(format!("no child at index {index}")))
        })
        .method("find_view_by_id", &[ParamType::Int], |env, args| {
            let target = args[0].as_i64().unwrap_or(-1);
            if env.shadow_state(|s: &mut ShadowView| s.id)? == target {
                return Ok(Value::object(env.receiver().clone()));
            }
            let children = env.shadow_state(|s: &mut ShadowView| s.children.clone())?;
            for child in children {
                let found = env.runtime().invoke(&child, "find_view_by_id", args)?;
                if !found.is_null() {
                    return Ok(found);
                }
            }
            Ok(Value::null())
        })
        .method("root_view", &[], |env, _args| {
            let mut current = env.receiver().clone();
            loop {
                let shadow = env.runtime().shadow_of(&current)?;
                let parent = shadow
                    .with_state(|s: &mut ShadowView| s.parent.as_ref().and_then(Weak::upgrade))?;
                match parent {
                    Some(parent) => current = parent,
                    None => return Ok(Value::object(current)),
                }
            }
        })
        .method("set_visibility", &[ParamType::Int], |env, args| {
            let v = args[0].as_i64().unwrap_or(0);
            env.shadow_state(|s: &mut ShadowView| s.visibility = v)?;
            Ok(Value::null())
        })
        .method("visibility", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowView| Value::int(s.visibility))
        })
        .method("set_selected", &[ParamType::Bool], |env, args| {
            let v = args[0].as_bool().unwrap_or(false);
            env.shadow_state(|s: &mut ShadowView| s.selected = v)?;
            Ok(Value::null())
        })
        .method("is_selected", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowView| Value::bool(s.selected))
        })
        .build()
}

fn shadow_text_view_def(parent: ShadowClassId) -> ShadowClassDef {
    ShadowClassBuilder::new("ShadowTextView")
        .parent(parent)
        .state(ShadowTextView::default)
        .method("set_text", &[ParamType::Str], |env, args| {
            let text = args[0].as_str().unwrap_or("").to_string();
            env.shadow_state(|s: &mut ShadowTextView| s.text = text)?;
            Ok(Value::null())
        })
        .method("text", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowTextView| Value::str(s.text.clone()))
        })
        .build()
}
