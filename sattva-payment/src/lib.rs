pub mod esewa;
pub mod gateway;

pub use esewa::{build_gateway, EsewaConfig, GatewayVersion};
pub use gateway::{
    new_transaction_uuid, FormField, GatewayError, PaymentGateway, PaymentInitiation,
    Verification,
};
