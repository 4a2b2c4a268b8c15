// models.rs
// Domain documents for the MongoDB collections plus seed-file shapes.

use bson::{DateTime, oid::ObjectId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Three-tier role hierarchy. Comparisons go through `nivel()`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rol {
    Cobrador,
    Supervisor,
    Administrador,
}

impl Rol {
    pub fn nivel(&self) -> u8 {
        match self {
            Rol::Cobrador => 1,
            Rol::Supervisor => 2,
            Rol::Administrador => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Cobrador => "COBRADOR",
            Rol::Supervisor => "SUPERVISOR",
            Rol::Administrador => "ADMINISTRADOR",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Rol::Administrador)
    }
}

impl Default for Rol {
    fn default() -> Self {
        Rol::Cobrador
    }
}

/// Payment frequency of a loan. Each variant maps to a fixed day count,
/// except the business-day variants which use the shared working-day
/// calendar in `schedule`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoPago {
    Diario,
    LunesAViernes,
    LunesASabado,
    Semanal,
    Catorcenal,
    Quincenal,
    Mensual,
    FinDeMes,
    Trimestral,
    Cuatrimestral,
    Semestral,
    Anual,
}

impl TipoPago {
    pub fn parse(valor: &str) -> Option<TipoPago> {
        match valor.trim().to_uppercase().as_str() {
            "DIARIO" => Some(TipoPago::Diario),
            "LUNES_A_VIERNES" => Some(TipoPago::LunesAViernes),
            "LUNES_A_SABADO" => Some(TipoPago::LunesASabado),
            "SEMANAL" => Some(TipoPago::Semanal),
            "CATORCENAL" => Some(TipoPago::Catorcenal),
            "QUINCENAL" => Some(TipoPago::Quincenal),
            "MENSUAL" => Some(TipoPago::Mensual),
            "FIN_DE_MES" => Some(TipoPago::FinDeMes),
            "TRIMESTRAL" => Some(TipoPago::Trimestral),
            "CUATRIMESTRAL" => Some(TipoPago::Cuatrimestral),
            "SEMESTRAL" => Some(TipoPago::Semestral),
            "ANUAL" => Some(TipoPago::Anual),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoPrestamo {
    Activo,
    Cancelado,
    Renovado,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoMovimientoCaja {
    Entregado,
    Entrega,
    Gastado,
    Devuelto,
    Ajuste,
}

impl TipoMovimientoCaja {
    pub fn parse(valor: &str) -> Option<TipoMovimientoCaja> {
        match valor.trim().to_uppercase().as_str() {
            "ENTREGADO" => Some(TipoMovimientoCaja::Entregado),
            "ENTREGA" => Some(TipoMovimientoCaja::Entrega),
            "GASTADO" => Some(TipoMovimientoCaja::Gastado),
            "DEVUELTO" => Some(TipoMovimientoCaja::Devuelto),
            "AJUSTE" => Some(TipoMovimientoCaja::Ajuste),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoSusu {
    Activo,
    Completado,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoDispositivo {
    Pendiente,
    Aprobado,
    Rechazado,
}

/// Staff user. `permisos` holds fine-grained permission strings;
/// `limite_minutos` caps daily usage for collector accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub clave: String,
    pub nombre: String,
    pub rol: Rol,
    #[serde(default)]
    pub supervisor_id: Option<ObjectId>,
    #[serde(default)]
    pub permisos: Vec<String>,
    #[serde(default)]
    pub limite_minutos: Option<i64>,
    pub activo: bool,
}

/// Session document linking a token to a user and expiry. `ultima_actividad`
/// feeds the daily usage accumulator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sesion {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub token: String,
    pub usuario_email: String,
    pub expira_en: DateTime,
    pub ultima_actividad: DateTime,
}

/// Accumulated active seconds per user and calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsoDiario {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub usuario_id: ObjectId,
    pub fecha: String,
    pub segundos: i64,
}

/// Device awaiting or holding authorization to log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispositivo {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub device_id: String,
    pub descripcion: String,
    #[serde(default)]
    pub usuario_email: Option<String>,
    pub estado: EstadoDispositivo,
    pub creado: DateTime,
}

/// Borrower. Never hard-deleted once loans exist; `activo = false` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cliente {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub documento: String,
    pub nombre: String,
    pub direccion: String,
    pub telefono: String,
    pub activo: bool,
    pub creado_por: ObjectId,
    pub creado: DateTime,
}

/// Loan. The outstanding balance is never stored; it is recomputed from the
/// payment history every time (`schedule::saldo_pendiente`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prestamo {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub cliente_id: ObjectId,
    pub monto: Decimal,
    pub interes: Decimal,
    pub tipo_pago: TipoPago,
    pub cuotas: i32,
    pub valor_cuota: Decimal,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    pub estado: EstadoPrestamo,
    #[serde(default)]
    pub observaciones: Option<String>,
    pub creado_por: ObjectId,
    pub creado: DateTime,
}

/// Payment against a loan. Immutable once created except for the
/// `modificado` flag consumed by downstream tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pago {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub prestamo_id: ObjectId,
    pub monto: Decimal,
    pub fecha: DateTime,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub modificado: bool,
    pub registrado_por: ObjectId,
}

/// Bank-transfer evidence. Kept in its own ledger; it does not reduce the
/// loan balance (see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transferencia {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub prestamo_id: ObjectId,
    pub monto: Decimal,
    pub banco: String,
    pub referencia: String,
    pub fecha: DateTime,
    pub registrado_por: ObjectId,
}

/// Field expense by a staff user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gasto {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub usuario_id: ObjectId,
    pub concepto: String,
    pub monto: Decimal,
    pub fecha: DateTime,
}

/// Petty-cash movement. `saldo_anterior`/`saldo_nuevo` chain per collector;
/// the running balance is always derived by replaying the chain by fecha.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovimientoCaja {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub cobrador_id: ObjectId,
    #[serde(default)]
    pub asignado_por: Option<ObjectId>,
    pub tipo: TipoMovimientoCaja,
    pub monto: Decimal,
    pub saldo_anterior: Decimal,
    pub saldo_nuevo: Decimal,
    #[serde(default)]
    pub descripcion: Option<String>,
    pub fecha: DateTime,
}

/// Rotating savings group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Susu {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub nombre: String,
    pub monto_total: Decimal,
    pub monto_por_periodo: Decimal,
    pub periodo_actual: i32,
    pub estado: EstadoSusu,
    pub creado: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SusuParticipante {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub susu_id: ObjectId,
    #[serde(default)]
    pub cliente_id: Option<ObjectId>,
    pub nombre: String,
    pub orden: i32,
    pub ya_recibio: bool,
    pub activo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SusuPago {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub susu_id: ObjectId,
    pub participante_id: ObjectId,
    pub numero_periodo: i32,
    pub monto: Decimal,
    pub fecha: DateTime,
}

/// End-of-day closure. While a closure exists for a date, collector-role
/// users cannot record payments or expenses on that date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CierreDia {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub fecha: String,
    pub cerrado_por: ObjectId,
    pub creado: DateTime,
}

/// Append-only snapshot of an entity deleted by a non-administrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistroAuditoria {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub usuario_id: ObjectId,
    pub tipo_entidad: String,
    pub entidad_id: String,
    pub detalles: serde_json::Value,
    pub ip: String,
    pub user_agent: String,
    pub fecha: DateTime,
}

/// User definition as read from the seed file (usuarios.json).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUsuario {
    pub email: String,
    pub clave: String,
    pub nombre: String,
    #[serde(default)]
    pub rol: Rol,
    #[serde(default)]
    pub permisos: Vec<String>,
    #[serde(default)]
    pub limite_minutos: Option<i64>,
}
