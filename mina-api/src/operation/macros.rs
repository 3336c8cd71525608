//! Declarative macros for bus operation definitions
//!
//! Most bus calls take a flat JSON object and answer with nothing more than a
//! success envelope. This macro generates the request struct and the
//! [`UbusOperation`](crate::operation::UbusOperation) impl for those.

/// Define a bus operation with a flat request and a raw response
///
/// `fixed` fields are serialized with every request but are not constructor
/// arguments.
///
/// # Example
/// ```rust,ignore
/// define_ubus_operation! {
///     operation: SetVolumeOperation,
///     method: "player_set_volume",
///     service: MediaPlayer,
///     request: {
///         volume: u8,
///     },
///     fixed: {
///         media: "app_ios",
///     },
/// }
/// ```
#[macro_export]
macro_rules! define_ubus_operation {
    (
        operation: $op_struct:ident,
        method: $method:literal,
        service: $service:ident,
        request: {
            $($field:ident: $field_type:ty),* $(,)?
        }
        $(, fixed: {
            $($fixed_field:ident: $fixed_value:literal),* $(,)?
        })? $(,)?
    ) => {
        paste::paste! {
            #[derive(serde::Serialize, Clone, Debug, PartialEq)]
            pub struct [<$op_struct Request>] {
                $(pub $field: $field_type,)*
                $($(pub $fixed_field: &'static str,)*)?
            }

            impl [<$op_struct Request>] {
                #[allow(clippy::new_without_default)]
                pub fn new($($field: $field_type),*) -> Self {
                    Self {
                        $($field,)*
                        $($($fixed_field: $fixed_value,)*)?
                    }
                }
            }

            pub struct $op_struct;

            impl $crate::operation::UbusOperation for $op_struct {
                type Request = [<$op_struct Request>];
                type Response = $crate::operation::UbusResponse;

                const SERVICE: $crate::service::Service = $crate::service::Service::$service;
                const METHOD: &'static str = $method;

                fn parse_response(
                    response: $crate::operation::UbusResponse,
                ) -> Result<Self::Response, $crate::error::ApiError> {
                    Ok(response)
                }
            }
        }
    };
}
