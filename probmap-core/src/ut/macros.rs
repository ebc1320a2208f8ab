// Copyright (c) 2025-2026, Tom Ouellette
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// A copy of the License has been included in the root of the repository.

/// Forward a method on every variant of a precision enum to its buffer
#[macro_export]
macro_rules! impl_enum_dispatch {
    ($enum_name:ident, $($variant:ident),*; $fn_name:ident(&self) -> $ret:ty) => {
        impl $enum_name {
            pub fn $fn_name(&self) -> $ret {
                match self {
                    $(Self::$variant(v) => v.$fn_name(),)*
                }
            }
        }
    };
}
