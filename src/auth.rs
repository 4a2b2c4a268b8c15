// auth.rs
// Authorization: role hierarchy checks and the per-request capability set.
// The session middleware evaluates `Capacidades` once; handlers only ask it.

use std::collections::HashSet;

use crate::error::ApiError;
use crate::models::Rol;

/// Recommended grant list for supervisors. Applied explicitly by an admin
/// action, never auto-granted.
pub const PERMISOS_SUPERVISOR: &[&str] = &[
    "clientes.ver",
    "clientes.crear",
    "clientes.editar",
    "clientes.eliminar",
    "prestamos.ver",
    "prestamos.crear",
    "prestamos.renovar",
    "pagos.ver",
    "pagos.crear",
    "gastos.ver",
    "gastos.crear",
    "caja.ver",
    "caja.asignar",
    "susu.ver",
    "susu.gestionar",
    "reportes.ver",
    "cierres.gestionar",
];

/// Recommended grant list for collectors.
pub const PERMISOS_COBRADOR: &[&str] = &[
    "clientes.ver",
    "clientes.crear",
    "prestamos.ver",
    "pagos.ver",
    "pagos.crear",
    "gastos.crear",
    "caja.ver",
    "susu.ver",
];

pub fn permisos_por_defecto(rol: Rol) -> &'static [&'static str] {
    match rol {
        Rol::Supervisor => PERMISOS_SUPERVISOR,
        Rol::Cobrador => PERMISOS_COBRADOR,
        Rol::Administrador => &[],
    }
}

/// Capability set of the acting user, built once per request by the session
/// middleware: role, stored grants, and whether the daily usage cap ran out.
#[derive(Debug, Clone)]
pub struct Capacidades {
    rol: Rol,
    permisos: HashSet<String>,
    tiempo_agotado: bool,
}

impl Capacidades {
    pub fn nueva(rol: Rol, permisos: &[String], tiempo_agotado: bool) -> Self {
        Capacidades {
            rol,
            permisos: permisos.iter().cloned().collect(),
            tiempo_agotado,
        }
    }

    pub fn rol(&self) -> Rol {
        self.rol
    }

    /// Administrators pass every check; everyone else needs the grant.
    pub fn tiene_permiso(&self, permiso: &str) -> bool {
        self.rol.is_admin() || self.permisos.contains(permiso)
    }

    pub fn tiene_alguno(&self, permisos: &[&str]) -> bool {
        permisos.iter().any(|p| self.tiene_permiso(p))
    }

    pub fn tiene_todos(&self, permisos: &[&str]) -> bool {
        permisos.iter().all(|p| self.tiene_permiso(p))
    }

    fn exigir_tiempo(&self) -> Result<(), ApiError> {
        if self.tiempo_agotado && !self.rol.is_admin() {
            return Err(ApiError::Prohibido(
                "límite diario de uso agotado; contacte a su supervisor".into(),
            ));
        }
        Ok(())
    }

    /// Permission gate. The daily time limit blocks before the grant check
    /// and independently of it.
    pub fn exigir_permiso(&self, permiso: &str) -> Result<(), ApiError> {
        self.exigir_tiempo()?;
        if !self.tiene_permiso(permiso) {
            return Err(ApiError::Prohibido(format!(
                "permiso requerido: {permiso}"
            )));
        }
        Ok(())
    }

    pub fn exigir_alguno(&self, permisos: &[&str]) -> Result<(), ApiError> {
        self.exigir_tiempo()?;
        if self.tiene_alguno(permisos) {
            Ok(())
        } else {
            Err(ApiError::Prohibido(format!(
                "se requiere alguno de: {}",
                permisos.join(", ")
            )))
        }
    }

    pub fn exigir_rol(&self, minimo: Rol) -> Result<(), ApiError> {
        if self.rol.nivel() >= minimo.nivel() {
            Ok(())
        } else {
            Err(ApiError::Prohibido(format!(
                "se requiere rol {} o superior",
                minimo.as_str()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn permisos(lista: &[&str]) -> Vec<String> {
        lista.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn administrador_pasa_todo_sin_permisos_almacenados() {
        let caps = Capacidades::nueva(Rol::Administrador, &[], false);
        assert!(caps.tiene_permiso("clientes.eliminar"));
        assert!(caps.tiene_permiso("algo.que.no.existe"));
        assert!(caps.exigir_permiso("usuarios.gestionar").is_ok());
        assert!(caps.exigir_rol(Rol::Administrador).is_ok());
    }

    #[test]
    fn cobrador_sin_permisos_falla_todo() {
        let caps = Capacidades::nueva(Rol::Cobrador, &[], false);
        assert!(!caps.tiene_permiso("pagos.crear"));
        assert!(caps.exigir_permiso("pagos.crear").is_err());
        assert!(caps.exigir_rol(Rol::Supervisor).is_err());
        assert!(caps.exigir_rol(Rol::Cobrador).is_ok());
    }

    #[test]
    fn combinadores_alguno_y_todos() {
        let caps = Capacidades::nueva(
            Rol::Supervisor,
            &permisos(&["pagos.ver", "pagos.crear"]),
            false,
        );
        assert!(caps.tiene_alguno(&["pagos.crear", "usuarios.gestionar"]));
        assert!(!caps.tiene_alguno(&["usuarios.gestionar", "auditoria.ver"]));
        assert!(caps.tiene_todos(&["pagos.ver", "pagos.crear"]));
        assert!(!caps.tiene_todos(&["pagos.ver", "usuarios.gestionar"]));
    }

    #[test]
    fn limite_de_tiempo_bloquea_aunque_tenga_permiso() {
        let caps = Capacidades::nueva(Rol::Cobrador, &permisos(&["pagos.crear"]), true);
        assert!(caps.tiene_permiso("pagos.crear"));
        let err = caps.exigir_permiso("pagos.crear").unwrap_err();
        assert!(err.to_string().contains("límite diario"));
    }

    #[test]
    fn jerarquia_de_roles() {
        assert!(Rol::Administrador.nivel() > Rol::Supervisor.nivel());
        assert!(Rol::Supervisor.nivel() > Rol::Cobrador.nivel());
        let caps = Capacidades::nueva(Rol::Supervisor, &[], false);
        assert!(caps.exigir_rol(Rol::Cobrador).is_ok());
        assert!(caps.exigir_rol(Rol::Administrador).is_err());
    }
}
