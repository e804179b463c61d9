//! Chilean regions and their communes.
//!
//! Shipping addresses must name a region and a commune within it.

use std::cmp::Ordering;

/// Region name to commune list, as offered in the checkout form.
const DIRECTORY: &[(&str, &[&str])] = &[
    (
        "Antofagasta",
        &[
            "Antofagasta",
            "Baquedano",
            "Calama",
            "La Negra",
            "María Elena",
            "Mejillones",
            "Ollague",
            "San Pedro de Atacama",
            "Sierra Gorda",
            "Taltal",
            "Tocopilla",
        ],
    ),
    (
        "Araucanía",
        &[
            "Angol",
            "Carahue",
            "Chol Chol",
            "Collipuylli",
            "Cunco",
            "Curacautin",
            "Curarrehue",
            "Ercilla",
            "Freire",
            "Galvarino",
            "Gorbea",
            "Lautaro",
            "Loncoche",
            "Lonquimay",
            "Los Sauces",
            "Lumaco",
            "Melipeuco",
            "Nueva Imperial",
            "Padre las casas",
            "Perquenco",
            "Pitrufquen",
            "Pucón",
            "Puren",
            "Renaico",
            "Saavedra",
            "Temuco",
            "Teodoro Schmidt",
            "Toltén",
            "Traiguen",
            "Victoria",
            "Vilcun",
            "Villarrica",
        ],
    ),
    (
        "Arica y Parinacota",
        &[
            "Arica",
            "Camarones",
            "General Lagos",
            "Putre",
        ],
    ),
    (
        "Atacama",
        &[
            "Alto del Carmen",
            "Caldera",
            "Chañaral",
            "Copiapó",
            "Diego de Almagro",
            "El Salvador",
            "Freirina",
            "Huasco",
            "Tierra Amarilla",
            "Vallenar",
        ],
    ),
    (
        "Aysén",
        &[
            "Aysén",
            "Chile Chico",
            "Cisnes",
            "Cochrane",
            "Coyhaique",
            "Guaitecas",
            "Lago Verde",
            "O'Higgins",
            "Río Ibáñez",
            "Tortel",
        ],
    ),
    (
        "Biobío",
        &[
            "Alto Biobío",
            "Antuco",
            "Arauco",
            "Cabrero",
            "Cañete",
            "Chiguayante",
            "Concepción",
            "Contulmo",
            "Coronel",
            "Curanilahue",
            "Florida",
            "Hualpén",
            "Hualqui",
            "Laja",
            "Lebu",
            "Los Álamos",
            "Los Ángeles",
            "Lota",
            "Penco",
            "Quilaco",
            "Quilleco",
            "San Pedro de la Paz",
            "San Rosendo",
            "Santa Bárbara",
            "Santa Juana",
            "Talcahuano",
            "Tirúa",
            "Tomé",
            "Tucapel",
            "Yumbel",
        ],
    ),
    (
        "Coquimbo",
        &[
            "Andacollo",
            "Canela",
            "Combarbalá",
            "Coquimbo",
            "Illapel",
            "La Higuera",
            "La Serena",
            "Los Vilos",
            "Monte Patria",
            "Ovalle",
            "Paiguano",
            "Punitaqui",
            "Río Hurtado",
            "Salamanca",
            "Vicuña",
        ],
    ),
    (
        "Libertador General Bernardo O'Higgins",
        &[
            "Chepica",
            "Chimbarongo",
            "Codegua",
            "Coinco",
            "Coltauco",
            "Donihue",
            "Graneros",
            "La Estrella",
            "Las Cabras",
            "Las Nieves - Rancagu",
            "Litueche",
            "Lolol",
            "Machali",
            "Malloas",
            "Marchihue",
            "Mostazal",
            "Nancagua",
            "Navidad",
            "Olivar - Alto",
            "Olivar - Bajo",
            "Palmilla",
            "Paredones",
            "Peralillo",
            "Peumo",
            "Pichidegua",
            "Pichilemu",
            "Placilla",
            "Pumanque",
            "Quinta de Tilcoco",
            "Rancagua",
            "Rengo",
            "Requinoa",
            "San Fernando",
            "Santa Cruz",
            "San Vicente",
        ],
    ),
    (
        "Los Lagos",
        &[
            "Ancud",
            "Calbuco",
            "Castro",
            "Chaiten",
            "Chonchi",
            "Cochamo",
            "Curaco de Velez",
            "Dalcahue",
            "Fresia",
            "Frutillar",
            "Futaleufu",
            "Hualaihue",
            "Llanquihue",
            "Los Muermos",
            "Maullin",
            "Osorno",
            "Palena",
            "Puerto Montt",
            "Puerto Octay",
            "Puerto Varas",
            "Puqueldon",
            "Purranque",
            "Puyehue",
            "Queilen",
            "Quellon",
            "Quemchi",
            "Quinchao",
            "Rio Negro",
            "San Juan de la Costa",
            "San Pablo",
        ],
    ),
    (
        "Los Ríos",
        &[
            "Corral",
            "Futrono",
            "Lago Ranco",
            "Lanco",
            "La Union",
            "Los Lagos",
            "Mafil",
            "Mariquina",
            "Paillaco",
            "Panguipulli",
            "Rio Bueno",
            "Valdivia",
        ],
    ),
    (
        "Magallanes y la Antártica Chilena",
        &[
            "Antártica",
            "Cabo de Hornos",
            "Laguna Blanca",
            "Natales",
            "Porvenir",
            "Primavera",
            "Punta Arenas",
            "Río Verde",
            "San Gregorio",
            "Timaukel",
            "Torres del Paine",
        ],
    ),
    (
        "Maule",
        &[
            "Cauquenes",
            "Chanco",
            "Colbun",
            "Constitucion",
            "Curepto",
            "Curico",
            "Empedrado",
            "Hualane",
            "Licanten",
            "Linares",
            "Longavi",
            "Maule",
            "Molina",
            "Parral",
            "Pelarco",
            "Pelluhue",
            "Pencahue",
            "Rauco",
            "Retiro",
            "Rio Claro",
            "Romeral",
            "Sagrada Familia",
            "San Clemente",
            "San Javier",
            "San Rafael",
            "Talca",
            "Teno",
            "Vichuquen",
            "Villa Alegre",
            "Yerbas Buenas",
        ],
    ),
    (
        "Metropolitana",
        &[
            "Alhue",
            "Buin",
            "Calera de Tango",
            "Cerrillos",
            "Cerro Navia",
            "Colina",
            "Conchali",
            "Curacavi",
            "El Bosque",
            "El Monte",
            "Estacion Central",
            "Huechuraba",
            "Independencia",
            "Isla de Maipo",
            "La Cisterna",
            "La Florida",
            "La Granja",
            "Lampa",
            "La Pintana",
            "La Reina",
            "Las Condes",
            "Lo Barnechea",
            "Lo Espejo",
            "Lo Prado",
            "Macul",
            "Maipu",
            "Maria Pinto",
            "Melipilla",
            "Nunoa",
            "Padre Hurtado",
            "Paine",
            "Pedro Aguirre Cerda",
            "Penaflor",
            "Penalolen",
            "Pirque",
            "Providencia",
            "Pudahuel",
            "Puente Alto",
            "Quilicura",
            "Quinta Normal",
            "Recoleta",
            "Renca",
            "San Bernardo",
            "San Joaquin",
            "San Jose de Maipo",
            "San Miguel",
            "San Pedro",
            "San Ramon",
            "Santiago",
            "Talagante",
            "Tiltil",
            "Vitacura",
        ],
    ),
    (
        "Ñuble",
        &[
            "Bulnes",
            "Chillan",
            "Chillan Viejo",
            "Cobquecura",
            "Coelemu",
            "Coihueco",
            "El Carmen",
            "Ninhue",
            "Niquen",
            "Pemuco",
            "Pinto",
            "Portezuelo",
            "Quillon",
            "Quirihue",
            "Ranquil",
            "San Carlos",
            "San Fabian",
            "San Ignacio",
            "San Nicolas",
            "Trehuaco",
            "Yungay",
        ],
    ),
    (
        "Tarapacá",
        &[
            "Alto Hospicio",
            "Camina",
            "Colchane",
            "Huara",
            "Iquique",
            "Pica",
            "Pozo Almonte",
            "Tarapaca",
        ],
    ),
    (
        "Valparaíso",
        &[
            "Algarrobo",
            "Cabildo",
            "Calera",
            "Calle Larga",
            "Cartagena",
            "Casablanca",
            "Catemu",
            "Concon",
            "El Melon",
            "El Quisco",
            "El Tabo",
            "Hijuelas",
            "Isla de Pascua",
            "Juan Fernandez",
            "La Cruz",
            "La Ligua",
            "Limache",
            "Llaillay",
            "Los Andes",
            "Nogales",
            "Olmue",
            "Panquehue",
            "Papudo",
            "Petorca",
            "Placilla - V Del Mar",
            "Puchuncavi",
            "Putendo",
            "Quillota",
            "Quilpue",
            "Quintero",
            "Rinconada",
            "San Antonio",
            "San Esteban",
            "San Felipe",
            "Santa Maria",
            "Santo Domingo",
            "Valparaiso",
            "Villa Alemana",
        ],
    ),
];

/// All region names, in Spanish alphabetical order.
pub fn regions() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = DIRECTORY.iter().map(|(name, _)| *name).collect();
    names.sort_by(|a, b| spanish_order(a, b));
    names
}

/// Communes of a region in Spanish alphabetical order, or None for an unknown region.
pub fn communes(region: &str) -> Option<Vec<&'static str>> {
    let region = region.trim();
    DIRECTORY
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, communes)| {
            let mut communes = communes.to_vec();
            communes.sort_by(|a, b| spanish_order(a, b));
            communes
        })
}

/// Check if a region exists.
pub fn is_region(region: &str) -> bool {
    let region = region.trim();
    DIRECTORY.iter().any(|(name, _)| *name == region)
}

/// Check if a commune belongs to a region.
pub fn contains(region: &str, commune: &str) -> bool {
    let (region, commune) = (region.trim(), commune.trim());
    DIRECTORY
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, communes)| communes.contains(&commune))
        .unwrap_or(false)
}

/// Accent- and case-insensitive ordering, ties broken by the raw strings.
fn spanish_order(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn collation_key(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' | 'ü' | 'Ü' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
