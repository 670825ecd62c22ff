//! Static reference content served to every role.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chemical {
    pub name: &'static str,
    pub description: &'static str,
    pub epp: &'static str,
    pub first_aid: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChemicalGroup {
    pub title: &'static str,
    pub chemicals: &'static [Chemical],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuideSection {
    pub title: &'static str,
    pub paragraphs: &'static [&'static str],
}

pub const CHEMICAL_GUIDE: &[ChemicalGroup] = &[
    ChemicalGroup {
        title: "1. Sustancias Extremadamente Corrosivas (Ácidos y Bases Fuertes)",
        chemicals: &[
            Chemical {
                name: "Ácido Clorhídrico",
                description: "Ácido fuerte, corrosivo. Los vapores son muy irritantes para ojos y vías respiratorias.",
                epp: "Gafas/Máscara facial completa anti-salpicaduras. Guantes de goma (nitrilo o neopreno). Delantal/Traje resistente a químicos.",
                first_aid: "Contacto ocular/piel: Enjuagar inmediatamente con abundante agua por al menos 15-20 minutos. Inhalación: Trasladar a la víctima al aire fresco. Ingestión: NO inducir el vómito. Dar agua o leche (si está consciente). Buscar atención médica urgente.",
            },
            Chemical {
                name: "Hidróxido de Sodio (Soda Cáustica)",
                description: "Base fuerte, corrosiva. En forma sólida o disuelta, destruye tejidos por contacto.",
                epp: "Gafas/Máscara. Guantes de goma resistentes a álcalis. Traje de protección si se manipula la forma sólida o concentrada.",
                first_aid: "Mismo PA que Ácido Clorhídrico. La diferencia es que la neutralización inicial no es viable en PA. Enjuague prolongado y traslado inmediato al centro de salud.",
            },
        ],
    },
    ChemicalGroup {
        title: "2. Solventes y Líquidos Orgánicos (Inflamables/Tóxicos)",
        chemicals: &[
            Chemical {
                name: "Tolueno, Hexano, Benceno, Xilenos",
                description: "Líquidos volátiles, altamente inflamables. Tóxicos por inhalación o ingestión. Afectan el Sistema Nervioso Central (SNC). El Benceno es un carcinógeno conocido.",
                epp: "Gafas de seguridad. Guantes de nitrilo (verificar resistencia a solventes). Ventilación forzada o Respirador con filtro para vapores orgánicos.",
                first_aid: "Inhalación: Trasladar a la víctima al aire fresco, mantenerla caliente y en reposo. Ingestión: NO inducir el vómito. Contacto: Lavar con abundante agua y jabón. Buscar atención médica inmediatamente.",
            },
            Chemical {
                name: "Éter Etílico, Acetona, MEK",
                description: "Líquidos extremadamente inflamables y volátiles. Irritantes oculares y de las vías respiratorias.",
                epp: "Gafas de seguridad. Guantes de nitrilo. Ventilación y evitar fuentes de ignición.",
                first_aid: "Incendio: Usar extintores de polvo químico seco o CO2. Contacto/Inhalación/Ingestión: Mismo PA que Tolueno.",
            },
        ],
    },
    ChemicalGroup {
        title: "3. Otros Compuestos Controlados",
        chemicals: &[Chemical {
            name: "Permanganato de Potasio",
            description: "Agente oxidante fuerte. En forma sólida es irritante. En contacto con materiales orgánicos puede iniciar un incendio.",
            epp: "Gafas de seguridad. Guantes de nitrilo/látex. Evitar contacto con combustibles.",
            first_aid: "Contacto ocular/piel: Lavar con abundante agua. Ingestión: Dar grandes cantidades de agua y buscar atención médica.",
        }],
    },
];

pub const USER_GUIDE: &[GuideSection] = &[
    GuideSection {
        title: "1. Analizar un Nuevo Riesgo",
        paragraphs: &[
            "Navegue a la sección \"Analizar Riesgo\".",
            "Ingrese la ubicación específica del área a analizar (ej. \"Taller de carpintería\", \"Sótano\").",
            "Tome una foto con la cámara del dispositivo o suba una imagen desde su galería.",
            "Solicite el informe: la IA analizará la imagen y creará un informe detallado.",
            "El informe recién creado queda seleccionado y puede descargarse en formato PDF.",
        ],
    },
    GuideSection {
        title: "2. Historial de Informes",
        paragraphs: &[
            "Director y Autoridades pueden ver todos los informes generados en la institución.",
            "Los demás roles solo pueden ver los informes que ellos mismos han generado.",
        ],
    },
    GuideSection {
        title: "3. Guía de Químicos",
        paragraphs: &[
            "Referencia rápida sobre el manejo seguro de sustancias químicas controladas: descripción, EPP recomendado y primeros auxilios.",
        ],
    },
    GuideSection {
        title: "4. Gestionar Usuarios (Solo Director)",
        paragraphs: &[
            "Permite crear nuevas cuentas de usuario para el personal, asignando sus respectivos roles y credenciales de acceso.",
        ],
    },
    GuideSection {
        title: "5. Roles de Usuario y Permisos",
        paragraphs: &[
            "Director: acceso total. Puede ver todos los informes y gestionar usuarios.",
            "Autoridades: rol de supervisión. Puede ver todos los informes pero no puede generar nuevos ni gestionar usuarios.",
            "Intendente / Mayordomo / Personal de Servicio: pueden generar y ver sus propios informes.",
        ],
    },
];
