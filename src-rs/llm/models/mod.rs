// Provider protocols: request shaping and answer extraction

pub mod provider_handle;
pub mod provider_base;
pub mod claude;
pub mod custom;
pub mod openai;
