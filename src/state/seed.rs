// state/seed.rs
// Collection bootstrap and idempotent seeding of staff users from JSON.

use anyhow::Result;
use bson::doc;
use mongodb::Database;
use std::{env, fs};

use crate::models::{SeedUsuario, Usuario};

const COLECCIONES: &[&str] = &[
    "usuarios",
    "sesiones",
    "uso_diario",
    "dispositivos",
    "clientes",
    "prestamos",
    "pagos",
    "transferencias",
    "gastos",
    "movimientos_caja",
    "susus",
    "susu_participantes",
    "susu_pagos",
    "cierres",
    "auditoria",
];

pub async fn ensure_collections(db: &Database) -> Result<()> {
    let existing = db.list_collection_names().await?;
    for nombre in COLECCIONES {
        if !existing.iter().any(|n| n == nombre) {
            db.create_collection(*nombre).await?;
        }
    }

    // Unique indexes backing the Conflict checks.
    let clientes = db.collection::<crate::models::Cliente>("clientes");
    clientes
        .create_index(
            mongodb::IndexModel::builder()
                .keys(doc! { "documento": 1 })
                .options(
                    mongodb::options::IndexOptions::builder()
                        .unique(true)
                        .name("documento_unique".to_string())
                        .build(),
                )
                .build(),
        )
        .await
        .ok();
    let cierres = db.collection::<crate::models::CierreDia>("cierres");
    cierres
        .create_index(
            mongodb::IndexModel::builder()
                .keys(doc! { "fecha": 1 })
                .options(
                    mongodb::options::IndexOptions::builder()
                        .unique(true)
                        .name("fecha_unique".to_string())
                        .build(),
                )
                .build(),
        )
        .await
        .ok();
    Ok(())
}

pub async fn is_database_empty(db: &Database) -> Result<bool> {
    let usuarios = db.collection::<Usuario>("usuarios");
    Ok(usuarios.count_documents(doc! {}).await? == 0)
}

pub fn load_default_usuarios() -> Result<Vec<SeedUsuario>> {
    let ruta = env::var("USERS_FILE").unwrap_or_else(|_| "./data/usuarios.json".to_string());
    if let Ok(contenido) = fs::read_to_string(&ruta) {
        Ok(serde_json::from_str::<Vec<SeedUsuario>>(&contenido)?)
    } else {
        Ok(Vec::new())
    }
}

pub async fn seed_default_usuarios(db: &Database, semillas: &[SeedUsuario]) -> Result<()> {
    let usuarios = db.collection::<Usuario>("usuarios");
    for semilla in semillas {
        let existente = usuarios
            .find_one(doc! { "email": &semilla.email })
            .await?
            .is_some();
        if existente {
            continue;
        }
        usuarios
            .insert_one(Usuario {
                id: None,
                email: semilla.email.clone(),
                clave: semilla.clave.clone(),
                nombre: semilla.nombre.clone(),
                rol: semilla.rol,
                supervisor_id: None,
                permisos: semilla.permisos.clone(),
                limite_minutos: semilla.limite_minutos,
                activo: true,
            })
            .await?;
    }
    Ok(())
}
