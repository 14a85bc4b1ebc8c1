//! 判题后端客户端。
//!
//! `JudgeApi` trait 定义于 core crate，本模块提供基于 HTTP 的实现，
//! 对接后端的 `/submissions` REST 接口。

pub mod http;

pub use http::HttpJudgeClient;
