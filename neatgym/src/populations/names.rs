// Species naming.

use rand::seq::SliceRandom;
use rand::Rng;

static GENERA: &[&str] = &[
    "Agilis", "Ardens", "Asper", "Borealis", "Caelestis", "Calidus", "Celer", "Clarus",
    "Constans", "Durus", "Ferox", "Fervens", "Fluvialis", "Fragilis", "Gelidus", "Grandis",
    "Humilis", "Lacustris", "Laetus", "Lenis", "Lucidus", "Magnificus", "Maritimus", "Mitis",
    "Mobilis", "Montanus", "Nebulosus", "Obscurus", "Placidus", "Polaris", "Rapidus", "Serenus",
    "Silvestris", "Stabilis", "Suavis", "Tacitus", "Tardus", "Vastus", "Vigens", "Vividus",
];

static EPITHETS: &[&str] = &[
    "Aether", "Aqua", "Arbor", "Aura", "Avis", "Caelum", "Collis", "Flamma",
    "Flora", "Flumen", "Folium", "Fons", "Frons", "Herba", "Ignis", "Imber",
    "Iris", "Lapis", "Luna", "Mare", "Mons", "Nemus", "Nimbus", "Nubes",
    "Palus", "Piscis", "Ramus", "Rivus", "Rupes", "Saxum", "Semen", "Serpens",
    "Silva", "Sol", "Stella", "Terra", "Turbo", "Umbra", "Vallis", "Ventus",
];

/// Generates a random two-word species name, such as "Celer Umbra".
pub(super) fn species_name() -> String {
    let mut rng = rand::thread_rng();
    let genus = GENERA.choose(&mut rng).copied().unwrap_or("Incertus");
    let epithet = EPITHETS.choose(&mut rng).copied().unwrap_or("Ignotus");
    if rng.gen::<f32>() < 0.1 {
        format!("{} {} {}", genus, epithet, roman(rng.gen_range(2..=9)))
    } else {
        format!("{} {}", genus, epithet)
    }
}

fn roman(n: usize) -> &'static str {
    const NUMERALS: [&str; 10] = ["", "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX"];
    NUMERALS[n.min(9)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_have_two_or_three_words() {
        for _ in 0..100 {
            let name = species_name();
            let words = name.split(' ').count();
            assert!((2..=3).contains(&words), "{}", name);
        }
    }
}
