//! `#[derive(Typed)]` for tagpack.
//!
//! ```ignore
//! #[derive(Clone, Debug, PartialEq, Typed)]
//! #[tagpack(module = "shapes", structural)]
//! struct Point { x: i64, y: i64 }
//! ```
//!
//! Supported options inside `#[tagpack(...)]`:
//! - `module = "..."`: module tag, defaults to `module_path!()`
//! - `name = "..."`: class tag, defaults to the type name
//! - `structural`: implement `StructuralCodec` from the fields
//! - `slots`: like `structural`, but the fields are fixed slots and decoding
//!   starts from `Default`
//! - `export` / `import`: advertise hand-written `Exportable` / `Importable`
//!   impls to the dispatch chain

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, LitStr};

#[derive(Default)]
struct TypedArgs {
    module: Option<LitStr>,
    name: Option<LitStr>,
    structural: bool,
    slots: bool,
    export: bool,
    import: bool,
}

fn parse_args(input: &DeriveInput) -> syn::Result<TypedArgs> {
    let mut args = TypedArgs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("tagpack")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("module") {
                args.module = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("name") {
                args.name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("structural") {
                args.structural = true;
            } else if meta.path.is_ident("slots") {
                args.structural = true;
                args.slots = true;
            } else if meta.path.is_ident("export") {
                args.export = true;
            } else if meta.path.is_ident("import") {
                args.import = true;
            } else {
                return Err(meta.error("unsupported tagpack option"));
            }
            Ok(())
        })?;
    }
    Ok(args)
}

#[proc_macro_derive(Typed, attributes(tagpack))]
pub fn derive_typed(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Typed derive does not support generic types",
        ));
    }
    let args = parse_args(input)?;

    let module = match &args.module {
        Some(module) => quote!(#module),
        None => quote!(::std::module_path!()),
    };
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| LitStr::new(&ident.to_string(), ident.span()));

    let as_exportable = args.export.then(|| {
        quote! {
            fn as_exportable(&self) -> ::std::option::Option<&dyn ::tagpack::Exportable> {
                ::std::option::Option::Some(self)
            }
        }
    });
    let structure = args.structural.then(|| {
        quote! {
            fn structure(&self) -> ::std::option::Option<::tagpack::Structure> {
                ::std::option::Option::Some(<Self as ::tagpack::StructuralCodec>::to_structure(self))
            }
        }
    });
    let with_structure = args
        .structural
        .then(|| quote!(.with_structure::<Self>()));
    let with_import = args.import.then(|| quote!(.with_import::<Self>()));

    let codec = if args.structural {
        Some(structural_codec(input, args.slots)?)
    } else {
        None
    };

    Ok(quote! {
        impl ::tagpack::Typed for #ident {
            fn type_path(&self) -> ::tagpack::TypePath {
                <Self as ::tagpack::Describe>::path()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn eq_typed(&self, other: &dyn ::tagpack::Typed) -> bool {
                ::tagpack::eq_downcast(self, other)
            }

            #as_exportable
            #structure
        }

        impl ::tagpack::Describe for #ident {
            const MODULE: &'static str = #module;
            const NAME: &'static str = #name;

            fn descriptor() -> ::tagpack::TypeDescriptor {
                ::tagpack::TypeDescriptor::of::<Self>() #with_structure #with_import
            }
        }

        impl ::tagpack::IntoValue for #ident {
            fn into_value(self) -> ::tagpack::Value {
                ::tagpack::Value::Object(::tagpack::Object::new(self))
            }
        }

        impl ::tagpack::FromValue for #ident {
            fn from_value(
                value: ::tagpack::Value,
            ) -> ::std::result::Result<Self, ::tagpack::FromValueError> {
                let object = <::tagpack::Object as ::tagpack::FromValue>::from_value(value)?;
                object.downcast::<Self>().ok_or_else(|| ::tagpack::FromValueError::ObjectType {
                    expected: <Self as ::tagpack::Describe>::path().qualified_name(),
                    found: object.qualified_name(),
                })
            }
        }

        #codec
    })
}

fn structural_codec(input: &DeriveInput, slots: bool) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            ident,
            "structural Typed derive only supports structs",
        ));
    };

    match &data.fields {
        Fields::Named(named) => {
            let idents: Vec<&Ident> = named.named.iter().filter_map(|f| f.ident.as_ref()).collect();
            Ok(named_codec(ident, &idents, slots))
        }
        Fields::Unnamed(unnamed) if !slots => Ok(tuple_codec(ident, unnamed.unnamed.len())),
        Fields::Unit if !slots => Ok(tuple_codec(ident, 0)),
        _ => Err(syn::Error::new_spanned(
            ident,
            "slots require a struct with named fields",
        )),
    }
}

fn named_codec(ident: &Ident, fields: &[&Ident], slots: bool) -> TokenStream2 {
    let names: Vec<LitStr> = fields
        .iter()
        .map(|f| LitStr::new(&f.to_string(), f.span()))
        .collect();
    let arity = fields.len();
    let positional: Vec<Ident> = (0..arity).map(|i| format_ident!("__v{}", i)).collect();

    let collect_fields = quote! {
        let mut fields = ::tagpack::Fields::with_capacity(#arity);
        #( fields.insert(#names, ::std::clone::Clone::clone(&self.#fields)); )*
    };
    let from_fields = quote! {
        ::std::result::Result::Ok(Self {
            #( #fields: fields.take_as(#names)?, )*
        })
    };

    let (slots_const, to_structure, slots_arm) = if slots {
        (
            quote! {
                const SLOTS: ::std::option::Option<&'static [&'static str]> =
                    ::std::option::Option::Some(&[#(#names),*]);
            },
            quote! {
                #collect_fields
                ::tagpack::Structure::Slots(fields)
            },
            quote! {
                ::tagpack::Structure::Slots(fields) => {
                    let mut this = <Self as ::std::default::Default>::default();
                    for (slot, value) in fields {
                        match slot.as_str() {
                            #( #names => this.#fields = ::tagpack::FromValue::from_value(value)?, )*
                            _ => return ::std::result::Result::Err(::tagpack::FromValueError::UnknownSlot(slot)),
                        }
                    }
                    ::std::result::Result::Ok(this)
                }
            },
        )
    } else {
        (
            quote!(),
            quote! {
                #collect_fields
                ::tagpack::Structure::Attributes(fields.into_value())
            },
            quote! {
                ::tagpack::Structure::Slots(mut fields) => { #from_fields }
            },
        )
    };

    quote! {
        impl ::tagpack::StructuralCodec for #ident {
            #slots_const

            #[allow(unused_mut)]
            fn to_structure(&self) -> ::tagpack::Structure {
                #to_structure
            }

            #[allow(unused_mut)]
            fn from_structure(
                structure: ::tagpack::Structure,
            ) -> ::std::result::Result<Self, ::tagpack::FromValueError> {
                match structure {
                    ::tagpack::Structure::Attributes(bag) => {
                        let mut fields = ::tagpack::Fields::from_map(bag)?;
                        #from_fields
                    }
                    #slots_arm
                    ::tagpack::Structure::Sequence(items) => {
                        let [#(#positional),*] = ::tagpack::positional::<#arity>(items)?;
                        ::std::result::Result::Ok(Self {
                            #( #fields: ::tagpack::FromValue::from_value(#positional)?, )*
                        })
                    }
                }
            }
        }
    }
}

fn tuple_codec(ident: &Ident, arity: usize) -> TokenStream2 {
    let indices: Vec<syn::Index> = (0..arity).map(syn::Index::from).collect();
    let positional: Vec<Ident> = (0..arity).map(|i| format_ident!("__v{}", i)).collect();
    let construct = if arity == 0 {
        quote!(Self)
    } else {
        quote!(Self( #( ::tagpack::FromValue::from_value(#positional)? ),* ))
    };

    quote! {
        impl ::tagpack::StructuralCodec for #ident {
            fn to_structure(&self) -> ::tagpack::Structure {
                ::tagpack::Structure::Sequence(::std::vec![
                    #( ::tagpack::IntoValue::into_value(::std::clone::Clone::clone(&self.#indices)) ),*
                ])
            }

            fn from_structure(
                structure: ::tagpack::Structure,
            ) -> ::std::result::Result<Self, ::tagpack::FromValueError> {
                match structure {
                    ::tagpack::Structure::Sequence(items) => {
                        let [#(#positional),*] = ::tagpack::positional::<#arity>(items)?;
                        ::std::result::Result::Ok(#construct)
                    }
                    _ => ::std::result::Result::Err(::tagpack::FromValueError::Mismatch {
                        expected: "array",
                        found: "map",
                    }),
                }
            }
        }
    }
}
