//! Dialog shadows
//!
//! `Dialog`, `AlertDialog`, and `ProgressDialog` are pure storage off-host.
//! `ProgressDialog` deliberately has no dedicated shadow: it is covered by
//! `ShadowDialog` through nearest-ancestor resolution.

use umbra_core::{
    ParamType, RealClassBuilder, RuntimeBuilder, ShadowClassBuilder, ShadowClassDef,
    ShadowClassId, UmbraError, Value,
};

/// Shadow state for `Dialog`
#[derive(Default)]
pub struct ShadowDialog {
    /// Whether the dialog is currently shown
    pub showing: bool,
    /// Title, once set
    pub title: Option<String>,
}

/// Shadow state for `AlertDialog`
#[derive(Default)]
pub struct ShadowAlertDialog {
    /// Message, once set
    pub message: Option<String>,
    /// Choice items presented by the dialog
    pub items: Vec<Value>,
    /// Index of the most recently clicked item
    pub clicked_item: Option<i64>,
}

/// Register the dialog classes and their shadows
pub fn install(builder: &mut RuntimeBuilder) {
    let dialog = builder.register_class(RealClassBuilder::new("Dialog").build());
    builder.register_class(RealClassBuilder::new("AlertDialog").parent(dialog).build());
    builder.register_class(RealClassBuilder::new("ProgressDialog").parent(dialog).build());

    let shadow_dialog = builder.register_shadow_class(shadow_dialog_def());
    builder.register_shadow_class(shadow_alert_dialog_def(shadow_dialog));

    builder.register_shadow("Dialog", "ShadowDialog");
    builder.register_shadow("AlertDialog", "ShadowAlertDialog");
    // ProgressDialog: no registration, ShadowDialog covers it via its parent
}

fn shadow_dialog_def() -> ShadowClassDef {
    ShadowClassBuilder::new("ShadowDialog")
        .state(ShadowDialog::default)
        .method("show", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowDialog| s.showing = true)?;
            Ok(Value::null())
        })
        .method("dismiss", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowDialog| s.showing = false)?;
            Ok(Value::null())
        })
        .method("is_showing", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowDialog| Value::bool(s.showing))
        })
        .method("set_title", &[ParamType::Str], |env, args| {
            let title = args[0].as_str().unwrap_or("").to_string();
            env.shadow_state(|s: &mut ShadowDialog| s.title = Some(title))?;
            Ok(Value::null())
        })
        .method("title", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowDialog| {
                s.title.as_deref().map(|t| Value::str(t)).unwrap_or_default()
            })
        })
        .build()
}

fn shadow_alert_dialog_def(parent: ShadowClassId) -> ShadowClassDef {
    ShadowClassBuilder::new("ShadowAlertDialog")
        .parent(parent)
        .state(ShadowAlertDialog::default)
        .method("set_message", &[ParamType::Str], |env, args| {
            let message = args[0].as_str().unwrap_or("").to_string();
            env.shadow_state(|s: &mut ShadowAlertDialog| s.message = Some(message))?;
            Ok(Value::null())
        })
        .method("message", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowAlertDialog| {
                s.message.as_deref().map(|m| Value::str(m)).unwrap_or_default()
            })
        })
        .method("set_items", &[ParamType::List], |env, args| {
            let items = args[0].as_list().map(|items| items.to_vec()).unwrap_or_default();
            env.shadow_state(|s: &mut ShadowAlertDialog| s.items = items)?;
            Ok(Value::null())
        })
        .method("items", &[], |env, _args| {
            env.shadow_state(|s: &mut ShadowAlertDialog| Value::list(s.items.clone()))
        })
        .method("click_on_item", &[ParamType::Int], |env, args| {
            let index = args[0].as_i64().unwrap_or(-1);
            env.shadow_state(|s: &mut ShadowAlertDialog| {
                if index < 0 || index as usize >= s.items.len() {
                    return Err(UmbraError::Method(format!("no item at index {index}")));
                }
                s.clicked_item = Some(index);
                Ok(())
            })??;
            Ok(Value::null())
        })
        .build()
}
