//! 源码分析前端
//!
//! 前端负责发现原始声明并按源码顺序交给规范化器，
//! 本身不做任何规范化决策

pub mod c;
pub mod common;

pub use c::CFrontend;
pub use common::{
    FrontendFactory, LanguageFrontend, RawDeclaration, RawEmbeddedTag, RawEnum, RawField,
    RawFunction, RawFunctionProto, RawParameter, RawRecord, RawTagRef, RawType, RawTypedef,
    RawVariable, RecordKeyword, SupportedLanguage,
};
