// state module: AppState, initialization, and re-exports of submodules.

use anyhow::Result;
use bson::DateTime;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use mongodb::{Client, Collection};
use std::{env, time::SystemTime};

use crate::models::{
    CierreDia, Cliente, Dispositivo, Gasto, MovimientoCaja, Pago, Prestamo, RegistroAuditoria,
    Sesion, Susu, SusuPago, SusuParticipante, Transferencia, UsoDiario, Usuario,
};

mod auditoria;
mod caja;
mod cierres;
mod clientes;
mod dispositivos;
mod gastos;
mod pagos;
mod prestamos;
mod reportes;
mod seed;
mod susu;
mod usuarios;

pub use auditoria::*;
pub use caja::*;
pub use cierres::*;
pub use clientes::*;
pub use dispositivos::*;
pub use gastos::*;
pub use pagos::*;
pub use prestamos::*;
pub use reportes::*;
pub use susu::*;
pub use usuarios::*;

pub const SESSION_TTL_SECONDS: u64 = 60 * 60 * 24; // 1 day

#[derive(Clone)]
pub struct AppState {
    pub client: Client,
    pub usuarios: Collection<Usuario>,
    pub sesiones: Collection<Sesion>,
    pub uso_diario: Collection<UsoDiario>,
    pub dispositivos: Collection<Dispositivo>,
    pub clientes: Collection<Cliente>,
    pub prestamos: Collection<Prestamo>,
    pub pagos: Collection<Pago>,
    pub transferencias: Collection<Transferencia>,
    pub gastos: Collection<Gasto>,
    pub movimientos_caja: Collection<MovimientoCaja>,
    pub susus: Collection<Susu>,
    pub susu_participantes: Collection<SusuParticipante>,
    pub susu_pagos: Collection<SusuPago>,
    pub cierres: Collection<CierreDia>,
    pub auditoria: Collection<RegistroAuditoria>,
}

pub async fn init_state() -> Result<AppState> {
    let uri = env::var("MONGODB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    let db_name = env::var("MONGODB_DB").unwrap_or_else(|_| "cobranzas".to_string());

    let client = Client::with_uri_str(uri).await?;
    let db = client.database(&db_name);

    seed::ensure_collections(&db).await?;

    // Only seed when the database is effectively empty (no users).
    if seed::is_database_empty(&db).await? {
        let default_usuarios = seed::load_default_usuarios()?;
        seed::seed_default_usuarios(&db, &default_usuarios).await?;
    }

    Ok(AppState {
        client,
        usuarios: db.collection::<Usuario>("usuarios"),
        sesiones: db.collection::<Sesion>("sesiones"),
        uso_diario: db.collection::<UsoDiario>("uso_diario"),
        dispositivos: db.collection::<Dispositivo>("dispositivos"),
        clientes: db.collection::<Cliente>("clientes"),
        prestamos: db.collection::<Prestamo>("prestamos"),
        pagos: db.collection::<Pago>("pagos"),
        transferencias: db.collection::<Transferencia>("transferencias"),
        gastos: db.collection::<Gasto>("gastos"),
        movimientos_caja: db.collection::<MovimientoCaja>("movimientos_caja"),
        susus: db.collection::<Susu>("susus"),
        susu_participantes: db.collection::<SusuParticipante>("susu_participantes"),
        susu_pagos: db.collection::<SusuPago>("susu_pagos"),
        cierres: db.collection::<CierreDia>("cierres"),
        auditoria: db.collection::<RegistroAuditoria>("auditoria"),
    })
}

pub fn ahora() -> DateTime {
    DateTime::from_system_time(SystemTime::now())
}

pub fn hoy() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn fecha_como_str(fecha: NaiveDate) -> String {
    fecha.format("%Y-%m-%d").to_string()
}

/// Midnight UTC of a calendar day, as a BSON timestamp for range queries.
pub fn inicio_del_dia(fecha: NaiveDate) -> DateTime {
    DateTime::from_chrono(Utc.from_utc_datetime(&fecha.and_time(NaiveTime::MIN)))
}

/// Exclusive upper bound: midnight of the following day.
pub fn fin_del_dia(fecha: NaiveDate) -> DateTime {
    inicio_del_dia(fecha + chrono::Duration::days(1))
}
