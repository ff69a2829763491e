//! Protobuf shapes of `protocol.Transaction.raw` (Tron.proto) and the two contracts this
//! client builds. Field numbers follow the node's schema so a decode/encode pass is lossless.

pub const CONTRACT_TYPE_TRANSFER: i32 = 1;
pub const CONTRACT_TYPE_TRIGGER_SMART_CONTRACT: i32 = 31;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionRaw {
    #[prost(bytes="vec", tag="1")]
    pub ref_block_bytes: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag="3")]
    pub ref_block_num: i64,
    #[prost(bytes="vec", tag="4")]
    pub ref_block_hash: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag="8")]
    pub expiration: i64,
    #[prost(message, repeated, tag="9")]
    pub auths: ::prost::alloc::vec::Vec<Authority>,
    #[prost(bytes="vec", tag="10")]
    pub data: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, repeated, tag="11")]
    pub contract: ::prost::alloc::vec::Vec<Contract>,
    #[prost(bytes="vec", tag="12")]
    pub scripts: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag="14")]
    pub timestamp: i64,
    #[prost(int64, tag="18")]
    pub fee_limit: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Authority {
    #[prost(message, optional, tag="1")]
    pub account: ::core::option::Option<AccountId>,
    #[prost(bytes="vec", tag="2")]
    pub permission_name: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountId {
    #[prost(bytes="vec", tag="1")]
    pub name: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes="vec", tag="2")]
    pub address: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Contract {
    #[prost(int32, tag="1")]
    pub r#type: i32,
    #[prost(message, optional, tag="2")]
    pub parameter: ::core::option::Option<Any>,
    #[prost(bytes="vec", tag="3")]
    pub provider: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes="vec", tag="4")]
    pub contract_name: ::prost::alloc::vec::Vec<u8>,
    #[prost(int32, tag="5")]
    pub permission_id: i32,
}

/// `google.protobuf.Any`; `value` is kept as opaque bytes.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Any {
    #[prost(string, tag="1")]
    pub type_url: ::prost::alloc::string::String,
    #[prost(bytes="vec", tag="2")]
    pub value: ::prost::alloc::vec::Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransferContract {
    #[prost(bytes="vec", tag="1")]
    pub owner_address: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes="vec", tag="2")]
    pub to_address: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag="3")]
    pub amount: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TriggerSmartContract {
    #[prost(bytes="vec", tag="1")]
    pub owner_address: ::prost::alloc::vec::Vec<u8>,
    #[prost(bytes="vec", tag="2")]
    pub contract_address: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag="3")]
    pub call_value: i64,
    #[prost(bytes="vec", tag="4")]
    pub data: ::prost::alloc::vec::Vec<u8>,
    #[prost(int64, tag="5")]
    pub call_token_value: i64,
    #[prost(int64, tag="6")]
    pub token_id: i64,
}
