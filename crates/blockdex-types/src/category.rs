//! Toolbox categories.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoEnumIterator};

use crate::locale::LocaleCode;

/// Toolbox category a block belongs to.
///
/// Declaration order is the display priority: `Ord` follows it, so sorting
/// by category gives the toolbox order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Category {
    Logic,
    Loops,
    Math,
    Text,
    Lists,
    Variables,
    Functions,
    /// Board I/O, timing and the setup/loop skeleton.
    Arduino,
    Serial,
    Sensors,
    Motors,
    /// WiFi and MQTT.
    Network,
    /// Pixetto vision sensor.
    Vision,
}

impl Category {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        <Self as FromStr>::from_str(s.trim()).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Logic => "logic",
            Category::Loops => "loops",
            Category::Math => "math",
            Category::Text => "text",
            Category::Lists => "lists",
            Category::Variables => "variables",
            Category::Functions => "functions",
            Category::Arduino => "arduino",
            Category::Serial => "serial",
            Category::Sensors => "sensors",
            Category::Motors => "motors",
            Category::Network => "network",
            Category::Vision => "vision",
        }
    }

    /// Position in the toolbox (0 first).
    pub fn priority(&self) -> usize {
        *self as usize
    }

    /// Toolbox label in `locale`.
    pub fn display_name(&self, locale: LocaleCode) -> &'static str {
        labels(locale)[self.priority()]
    }

    /// All categories in priority order.
    pub fn all() -> impl Iterator<Item = Category> {
        Self::iter()
    }
}

const CATEGORY_COUNT: usize = 13;

type Labels = [&'static str; CATEGORY_COUNT];

// Rows follow declaration order.
fn labels(locale: LocaleCode) -> &'static Labels {
    match locale {
        LocaleCode::En => &[
            "Logic", "Loops", "Math", "Text", "Lists", "Variables", "Functions", "Arduino",
            "Serial", "Sensors", "Motors", "Network", "Vision",
        ],
        LocaleCode::ZhHant => &[
            "邏輯", "迴圈", "數學", "文字", "列表", "變數", "函式", "Arduino", "序列埠", "感測器",
            "馬達", "網路", "視覺",
        ],
        LocaleCode::Ja => &[
            "論理", "ループ", "数学", "テキスト", "リスト", "変数", "関数", "Arduino", "シリアル",
            "センサー", "モーター", "ネットワーク", "ビジョン",
        ],
        LocaleCode::Ko => &[
            "논리", "반복", "수학", "텍스트", "리스트", "변수", "함수", "Arduino", "시리얼",
            "센서", "모터", "네트워크", "비전",
        ],
        LocaleCode::Es => &[
            "Lógica", "Bucles", "Matemáticas", "Texto", "Listas", "Variables", "Funciones",
            "Arduino", "Serie", "Sensores", "Motores", "Red", "Visión",
        ],
        LocaleCode::Fr => &[
            "Logique", "Boucles", "Maths", "Texte", "Listes", "Variables", "Fonctions", "Arduino",
            "Série", "Capteurs", "Moteurs", "Réseau", "Vision",
        ],
        LocaleCode::De => &[
            "Logik", "Schleifen", "Mathematik", "Text", "Listen", "Variablen", "Funktionen",
            "Arduino", "Seriell", "Sensoren", "Motoren", "Netzwerk", "Bildverarbeitung",
        ],
        LocaleCode::It => &[
            "Logica", "Cicli", "Matematica", "Testo", "Liste", "Variabili", "Funzioni", "Arduino",
            "Seriale", "Sensori", "Motori", "Rete", "Visione",
        ],
        LocaleCode::PtBr => &[
            "Lógica", "Laços", "Matemática", "Texto", "Listas", "Variáveis", "Funções", "Arduino",
            "Serial", "Sensores", "Motores", "Rede", "Visão",
        ],
        LocaleCode::Ru => &[
            "Логика", "Циклы", "Математика", "Текст", "Списки", "Переменные", "Функции",
            "Arduino", "Serial", "Датчики", "Моторы", "Сеть", "Зрение",
        ],
        LocaleCode::Pl => &[
            "Logika", "Pętle", "Matematyka", "Tekst", "Listy", "Zmienne", "Funkcje", "Arduino",
            "Port szeregowy", "Czujniki", "Silniki", "Sieć", "Wizja",
        ],
        LocaleCode::Hu => &[
            "Logika", "Ciklusok", "Matematika", "Szöveg", "Listák", "Változók", "Függvények",
            "Arduino", "Soros port", "Érzékelők", "Motorok", "Hálózat", "Látás",
        ],
        LocaleCode::Cs => &[
            "Logika", "Cykly", "Matematika", "Text", "Seznamy", "Proměnné", "Funkce", "Arduino",
            "Sériová linka", "Senzory", "Motory", "Síť", "Vidění",
        ],
        LocaleCode::Bg => &[
            "Логика", "Цикли", "Математика", "Текст", "Списъци", "Променливи", "Функции",
            "Arduino", "Сериен порт", "Сензори", "Мотори", "Мрежа", "Зрение",
        ],
        LocaleCode::Tr => &[
            "Mantık", "Döngüler", "Matematik", "Metin", "Listeler", "Değişkenler", "Fonksiyonlar",
            "Arduino", "Seri port", "Sensörler", "Motorlar", "Ağ", "Görüntü",
        ],
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
