//! Defines the orrery runtime macros.

#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

extern crate proc_macro;

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, ItemFn, ReturnType, Stmt};

/// Macro definition for the orrery runtime.
///
/// This macro should be used once only in a project.
/// This macro requires `tokio` as a dependency.
///
/// _Executes the entire function in a blocking thread and provides synchronization for waiting on
/// all subsequently and dynamically created tasks (using `task::run`): typically the frame task
/// spawned by `Engine::start()`._
///
/// # Example
/// ```ignore
/// #[orrery::runtime]
/// async fn main() {
///     // whatever
/// }
/// ```
#[proc_macro_attribute]
pub fn runtime(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro(item, false)
}

/// Same as `#[orrery::runtime]` but for tests.
#[proc_macro_attribute]
pub fn test(_: TokenStream, item: TokenStream) -> TokenStream {
    runtime_macro(item, true)
}

/// Inner expansion shared by `#[orrery::runtime]` and `#[orrery_macros::test]`.
fn runtime_macro(item: TokenStream, test: bool) -> TokenStream {
    let orrery = orrery_crate_path();

    // Parse the input tokens into a syntax tree.
    let input = parse_macro_input!(item as ItemFn);
    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;

    // Extract the block's statements.
    let mut stmts = block.stmts;

    // Check if the function has an explicit return type.
    let has_return_type = match &sig.output {
        ReturnType::Default => false,
        ReturnType::Type(_, ty) => !matches!(&**ty, syn::Type::Tuple(tuple) if tuple.elems.is_empty()),
    };

    // Extract the last statement if it's an expression (potential return value).
    let return_expr = if has_return_type {
        match stmts.pop() {
            Some(Stmt::Expr(expr, ..)) => Some(expr),
            Some(stmt) => {
                stmts.push(stmt);
                None
            }
            None => None,
        }
    } else {
        None
    };

    // Define the #[tokio::main] / #[tokio::test] tokio macro attribute.
    let tokio_main_attr = match test {
        true => quote! {#[#orrery::utils::tokio::test]},
        _ => quote! {#[#orrery::utils::tokio::main]},
    };

    // Generate the function body: open the global task channel first.
    let mut body = vec![quote! {
        #orrery::utils::task::init_task_channel().await;
    }];

    // Insert the original function body statements.
    // A trailing unit expression "()" is dropped since the return expression is re-appended last.
    body.extend(stmts.into_iter().map(|stmt| match stmt {
        Stmt::Expr(ref exp, _) => match exp {
            syn::Expr::Tuple(tuple) if tuple.elems.is_empty() => quote!(),
            _ => quote! { #stmt },
        },
        _ => quote! { #stmt },
    }));

    // Wait for all dynamically spawned tasks to complete before leaving the runtime.
    body.push(quote! {
        let cell = #orrery::utils::task::RUNTIME_RX.get().ok_or(#orrery::errors::RuntimeError).unwrap();
        let mut lock = cell.lock();
        let receiver = lock.as_mut().ok_or(#orrery::errors::RuntimeError).unwrap();

        while receiver.len() > 0 {
            // We receive the task specific receiver.
            if let Some(mut task_receiver) = receiver.recv().await {
                // We receive the task result through that new receiver.
                if let Some(task_result) = task_receiver.recv().await {
                    match task_result {
                        #orrery::utils::task::TaskResult::Ok => {}
                        #orrery::utils::task::TaskResult::Err(err) => eprintln!("Task failed: {:?}", err.to_string()),
                    }
                }
            }
        }
    });

    // Add the return expression if there is one.
    if let Some(return_stmt) = return_expr {
        body.push(quote! { #return_stmt });
    }

    // Generate the expanded function.
    let expanded = quote! {
        #tokio_main_attr
        #(#attrs)*
        #vis #sig {
            #(#body)*
        }
    };

    TokenStream::from(expanded)
}

/// Determines what crate name should be used to refer to the engine crate:
/// crate::... or orrery::... depending.
fn orrery_crate_path() -> syn::Path {
    let is_internal = std::env::var("CARGO_CRATE_NAME")
        .map(|pkg_name| pkg_name == "orrery")
        .unwrap_or_default();

    if is_internal {
        syn::parse_quote!(crate)
    } else {
        syn::parse_quote!(orrery)
    }
}
