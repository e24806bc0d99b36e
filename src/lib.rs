// Núcleo de estoque multi-tenant: resolução de escopo, saldos por
// (produto, loja), livro-razão de movimentações e trilha de custo, com as
// três operações de mutação (venda, recebimento, ajuste manual).

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
